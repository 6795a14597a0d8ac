use thiserror::Error;

use crate::domain::{Config, Roster};

/// An owning record: any document type with an embedded [`Roster`].
pub trait EmailOwner {
    /// The embedded roster.
    fn emails(&self) -> &Roster;

    /// The embedded roster, mutably.
    fn emails_mut(&mut self) -> &mut Roster;
}

/// The external document-persistence collaborator.
///
/// The core calls into this boundary and nothing deeper: stores own
/// create/find/save semantics, index mechanics and uniqueness enforcement.
/// A conforming store applies [`Roster::assign_default_primary`] and then
/// [`validate`] before accepting any write, and surfaces a configured
/// uniqueness violation as [`StoreError::DuplicateAddress`].
pub trait EmailStore {
    /// The owning record type managed by this store.
    type Record: EmailOwner;

    /// Creates and persists a record with the given initial roster.
    ///
    /// # Errors
    ///
    /// Rejects the write if validation or a uniqueness constraint fails.
    fn create(&mut self, emails: Roster) -> Result<Self::Record, StoreError>;

    /// Persists the current state of a record.
    ///
    /// # Errors
    ///
    /// Rejects the write if validation or a uniqueness constraint fails;
    /// the record keeps its in-memory state either way.
    fn save(&mut self, record: &mut Self::Record) -> Result<(), StoreError>;

    /// All records containing the given address.
    fn find_by_address(&self, address: &str) -> Vec<Self::Record>;

    /// The first record containing the given address.
    fn find_one_by_address(&self, address: &str) -> Option<Self::Record>;

    /// The record whose roster carries the given verification code.
    fn find_by_code(&self, code: &str) -> Option<Self::Record>;

    /// Whether any record contains the given address.
    fn address_exists(&self, address: &str) -> bool {
        self.find_one_by_address(address).is_some()
    }
}

/// An entity-level invariant violation, detected at persistence time.
///
/// Any violation rejects the whole write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// More than one entry carries the primary marker.
    #[error("more than one primary email address")]
    MultiplePrimary,

    /// An entry's address fails the configured format predicate.
    #[error("invalid email address {0}")]
    InvalidAddress(String),

    /// The roster is empty but the configuration requires an entry.
    #[error("at least one email address is required")]
    Empty,
}

/// A rejected store write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The roster violates an entity-level invariant.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A configured uniqueness constraint matched an existing record.
    #[error("duplicate email address {0}")]
    DuplicateAddress(String),
}

/// Checks the persistence-time invariants of a roster.
///
/// Stores call this immediately before writing (after default-primary
/// promotion): at most one primary marker, every address matching the
/// configured format, and a non-empty roster when one is required.
///
/// # Errors
///
/// Returns the first violation found; the write must be rejected whole.
pub fn validate(config: &Config, roster: &Roster) -> Result<(), ValidationError> {
    if roster.primary_count() > 1 {
        return Err(ValidationError::MultiplePrimary);
    }

    for entry in roster {
        if !config.address_is_valid(entry.address()) {
            return Err(ValidationError::InvalidAddress(entry.address().to_owned()));
        }
    }

    if config.require_at_least_one() && roster.is_empty() {
        return Err(ValidationError::Empty);
    }

    Ok(())
}
