use std::fmt;

use uuid::Uuid;

/// Source of the random token appended to the configured prefix when a
/// verification code is generated.
///
/// The token is an opaque lookup key, not a secret: implementations need
/// collision resistance at scale, not cryptographic unpredictability.
/// Injecting the generator lets tests supply deterministic codes.
pub trait CodeGenerator: fmt::Debug + Send + Sync {
    /// Produces a fresh random token.
    fn generate(&self) -> String;
}

/// The default token source: a hyphenated v4 UUID.
///
/// 36 characters of lowercase hex with embedded separators, ~122 bits of
/// randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCodeGenerator;

impl CodeGenerator for UuidCodeGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
