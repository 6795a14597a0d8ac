//! Domain model for embedded email-address management.
//!
//! This module contains the pure in-memory types: the roster and its
//! entries, the behaviour configuration, and the verification-code
//! generator seam. Nothing in here performs I/O.

mod config;
pub use config::{Config, FieldNames, FieldNaming};

/// Email entries and the duck-typed parameter types that target them.
pub mod entry;
pub use entry::{EmailEntry, NewEntry, Selector, Verification};

/// The roster collection and its invariant-preserving operations.
pub mod roster;
pub use roster::{Error, Roster};

mod token;
pub use token::{CodeGenerator, UuidCodeGenerator};
