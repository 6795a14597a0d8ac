//! An in-memory reference store.
//!
//! [`MemoryStore`] implements the [`EmailStore`] boundary over a plain
//! vector of records: it applies default-primary promotion, runs the
//! persistence-time validators, and enforces the configured address
//! uniqueness across records. Useful in tests and as the reference for
//! what a real document-store adapter must do.

use uuid::Uuid;

use crate::{
    domain::{Config, Roster},
    storage::store::{EmailOwner, EmailStore, StoreError, validate},
};

/// An owning record as stored by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: Uuid,
    emails: Roster,
}

impl Record {
    /// The record's identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }
}

impl EmailOwner for Record {
    fn emails(&self) -> &Roster {
        &self.emails
    }

    fn emails_mut(&mut self) -> &mut Roster {
        &mut self.emails
    }
}

/// An in-memory [`EmailStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: Config,
    records: Vec<Record>,
}

impl MemoryStore {
    /// Creates an empty store with the given behaviour profile.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            records: Vec::new(),
        }
    }

    /// Creates a fresh record that has not been persisted yet.
    ///
    /// The caller mutates its roster and then [`EmailStore::save`]s it.
    #[must_use]
    pub fn create_empty(&self) -> Record {
        Record {
            id: Uuid::new_v4(),
            emails: Roster::new(),
        }
    }

    /// The number of persisted records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&mut self, record: &mut Record) -> Result<(), StoreError> {
        // persistence-time promotion: a non-empty roster never lands
        // without a primary
        record.emails.assign_default_primary();
        validate(&self.config, &record.emails)?;

        if self.config.unique_addresses() {
            self.check_unique(record)?;
        }

        if let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) {
            existing.clone_from(record);
        } else {
            self.records.push(record.clone());
        }
        tracing::debug!(record = %record.id, "record saved");

        Ok(())
    }

    fn check_unique(&self, record: &Record) -> Result<(), StoreError> {
        for entry in &record.emails {
            let taken = self
                .records
                .iter()
                .filter(|other| other.id != record.id)
                .any(|other| other.emails.contains(entry.address()));
            if taken {
                return Err(StoreError::DuplicateAddress(entry.address().to_owned()));
            }
        }
        Ok(())
    }
}

impl EmailStore for MemoryStore {
    type Record = Record;

    fn create(&mut self, emails: Roster) -> Result<Record, StoreError> {
        let mut record = Record {
            id: Uuid::new_v4(),
            emails,
        };
        self.persist(&mut record)?;
        Ok(record)
    }

    fn save(&mut self, record: &mut Record) -> Result<(), StoreError> {
        self.persist(record)
    }

    fn find_by_address(&self, address: &str) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| record.emails.contains(address))
            .cloned()
            .collect()
    }

    fn find_one_by_address(&self, address: &str) -> Option<Record> {
        self.records
            .iter()
            .find(|record| record.emails.contains(address))
            .cloned()
    }

    fn find_by_code(&self, code: &str) -> Option<Record> {
        self.records
            .iter()
            .find(|record| record.emails.entry_by_code(code).is_some())
            .cloned()
    }
}
