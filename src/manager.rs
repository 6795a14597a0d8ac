//! The configuration-bound operation bundle.
//!
//! A [`Manager`] pairs a [`Config`] with a verification-code generator and
//! exposes every operation whose behaviour depends on them: adding entries,
//! the verification lifecycle, the schema declaration, the document
//! mapping, and the `*_and_save` variants that delegate one persistence
//! call to an [`EmailStore`].

use chrono::{Duration, Utc};
use thiserror::Error;

use crate::{
    domain::{
        CodeGenerator, Config, Error, FieldNames, NewEntry, Roster, Selector, UuidCodeGenerator,
        entry::{EmailEntry, Verification},
    },
    storage::{
        EmailOwner, EmailStore, StoreError,
        document::{self, DocumentError, SchemaSpec},
    },
};

/// Operations over a roster under a resolved behaviour profile.
///
/// The manager holds no roster state of its own: every method operates on
/// the roster (or owning record) passed by the caller.
#[derive(Debug)]
pub struct Manager {
    config: Config,
    fields: FieldNames,
    codes: Box<dyn CodeGenerator>,
}

/// Failure of a `*_and_save` operation: either the in-memory mutation or
/// the delegated persistence call.
///
/// When the store side fails, the in-memory mutation has already happened;
/// no rollback is attempted. The caller discards or retries the record.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The in-memory mutation failed; nothing was sent to the store.
    #[error(transparent)]
    Email(#[from] Error),

    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Manager {
    /// Creates a manager with the default (UUID) code generator.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_code_generator(config, Box::new(UuidCodeGenerator))
    }

    /// Creates a manager with an injected code generator.
    #[must_use]
    pub fn with_code_generator(config: Config, codes: Box<dyn CodeGenerator>) -> Self {
        let fields = config.field_names();
        Self {
            config,
            fields,
            codes,
        }
    }

    /// The active behaviour profile.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The resolved external field names.
    #[must_use]
    pub const fn fields(&self) -> &FieldNames {
        &self.fields
    }

    /// Appends a new entry to the roster.
    ///
    /// The entry never receives primary status here, even into an empty
    /// roster; promotion is a persistence-time concern
    /// ([`Roster::assign_default_primary`]). Returns the entry re-resolved
    /// by address, mirroring the lookup callers would perform.
    pub fn add<'a>(&self, roster: &'a mut Roster, entry: impl Into<NewEntry>) -> &'a EmailEntry {
        let entry = entry.into();
        let address = entry.address().to_owned();
        let id = self.config.entry_ids().then(uuid::Uuid::new_v4);

        roster.push(EmailEntry::new(entry.into_address(), id));
        tracing::debug!(address = %address, "email entry added");

        roster
            .entry(address.as_str())
            .expect("entry was just appended")
    }

    /// Starts (or restarts) the verification process for an entry.
    ///
    /// Generates a fresh code of `prefix + token` and, when the effective
    /// expiration is positive, an expiry of now plus that many hours.
    /// `expiration_hours` of `None` uses the configured default. Any prior
    /// unconfirmed verification block is replaced wholesale, invalidating
    /// its code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no entry matches the selector, and
    /// [`Error::AlreadyVerified`] if the entry is already confirmed.
    pub fn start_verification<'a>(
        &self,
        roster: &'a mut Roster,
        selector: impl Into<Selector>,
        expiration_hours: Option<i64>,
    ) -> Result<&'a EmailEntry, Error> {
        let selector = selector.into();
        let hours = expiration_hours.unwrap_or(self.config.verification_code_expiration_hours());

        let Some(index) = roster.index_of(&selector) else {
            return Err(Error::NotFound(selector.into_address()));
        };
        if roster.get_at(index).is_verified() {
            return Err(Error::AlreadyVerified(selector.into_address()));
        }

        let code = format!(
            "{}{}",
            self.config.verification_code_prefix(),
            self.codes.generate()
        );
        let expires = (hours > 0).then(|| Utc::now() + Duration::hours(hours));

        let entry = roster.get_at_mut(index);
        entry.verification = Some(Verification {
            code,
            expires,
            confirmed: None,
        });
        tracing::debug!(address = %entry.address(), "verification started");

        Ok(roster.get_at(index))
    }

    /// Confirms the entry holding the presented verification code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCode`] if no entry carries the code,
    /// [`Error::AlreadyVerified`] if the entry is already confirmed, and
    /// [`Error::CodeExpired`] if the code's expiration has passed
    /// (exactly-at-expiration counts as expired).
    pub fn confirm_verification<'a>(
        &self,
        roster: &'a mut Roster,
        code: &str,
    ) -> Result<&'a EmailEntry, Error> {
        let Some(index) = roster.index_of_code(code) else {
            return Err(Error::UnknownCode(code.to_owned()));
        };

        let entry = roster.get_at_mut(index);
        let address = entry.address().to_owned();
        let Some(verification) = entry.verification.as_mut() else {
            // unreachable through index_of_code; an entry without a
            // verification block cannot match a code
            return Err(Error::UnknownCode(code.to_owned()));
        };

        if verification.is_confirmed() {
            return Err(Error::AlreadyVerified(address));
        }
        if verification.is_expired_at(Utc::now()) {
            return Err(Error::CodeExpired(address));
        }

        verification.confirmed = Some(Utc::now());
        tracing::debug!(address = %address, "email verified");

        Ok(roster.get_at(index))
    }

    /// [`Manager::add`], then one persistence call on the owning record.
    ///
    /// # Errors
    ///
    /// Propagates any store failure; the in-memory roster keeps the added
    /// entry either way.
    pub fn add_and_save<S: EmailStore>(
        &self,
        store: &mut S,
        record: &mut S::Record,
        entry: impl Into<NewEntry>,
    ) -> Result<EmailEntry, SaveError> {
        let address = self.add(record.emails_mut(), entry).address().to_owned();
        store.save(record)?;
        Ok(resolve_saved(record.emails(), &address))
    }

    /// [`Roster::set_primary`], then one persistence call on the owning
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] (wrapped) before touching the store, or
    /// the store's failure afterwards.
    pub fn set_primary_and_save<S: EmailStore>(
        &self,
        store: &mut S,
        record: &mut S::Record,
        selector: impl Into<Selector>,
    ) -> Result<EmailEntry, SaveError> {
        let address = record
            .emails_mut()
            .set_primary(selector)?
            .address()
            .to_owned();
        store.save(record)?;
        Ok(resolve_saved(record.emails(), &address))
    }

    /// [`Roster::remove`], then one persistence call on the owning record.
    ///
    /// The save happens whether or not anything was removed, matching the
    /// tolerated-no-op semantics of removal.
    ///
    /// # Errors
    ///
    /// Propagates any store failure.
    pub fn remove_and_save<S: EmailStore>(
        &self,
        store: &mut S,
        record: &mut S::Record,
        selector: impl Into<Selector>,
    ) -> Result<Option<EmailEntry>, SaveError> {
        let removed = record.emails_mut().remove(selector);
        store.save(record)?;
        Ok(removed)
    }

    /// [`Manager::start_verification`], then one persistence call on the
    /// owning record.
    ///
    /// # Errors
    ///
    /// Returns the in-memory failure before touching the store, or the
    /// store's failure afterwards.
    pub fn start_verification_and_save<S: EmailStore>(
        &self,
        store: &mut S,
        record: &mut S::Record,
        selector: impl Into<Selector>,
        expiration_hours: Option<i64>,
    ) -> Result<EmailEntry, SaveError> {
        let address = self
            .start_verification(record.emails_mut(), selector, expiration_hours)?
            .address()
            .to_owned();
        store.save(record)?;
        Ok(resolve_saved(record.emails(), &address))
    }

    /// [`Manager::confirm_verification`], then one persistence call on the
    /// owning record.
    ///
    /// # Errors
    ///
    /// Returns the in-memory failure before touching the store, or the
    /// store's failure afterwards.
    pub fn confirm_verification_and_save<S: EmailStore>(
        &self,
        store: &mut S,
        record: &mut S::Record,
        code: &str,
    ) -> Result<EmailEntry, SaveError> {
        let address = self
            .confirm_verification(record.emails_mut(), code)?
            .address()
            .to_owned();
        store.save(record)?;
        Ok(resolve_saved(record.emails(), &address))
    }

    /// Declares the schema requirements for the embedded roster field.
    ///
    /// Pure declaration, no I/O: lookup indexes (when indexing is on), the
    /// optional uniqueness constraint, and the required-non-empty flag, all
    /// spelled with the resolved field names. Stores consume this once per
    /// schema.
    #[must_use]
    pub fn schema_spec(&self) -> SchemaSpec {
        SchemaSpec::declare(&self.config, &self.fields)
    }

    /// Renders a roster as its external document representation.
    ///
    /// The result is an object holding the embedded array under the
    /// resolved collection field name, ready to merge into the owning
    /// record's document.
    #[must_use]
    pub fn roster_to_document(&self, roster: &Roster) -> serde_json::Value {
        document::to_document(roster, &self.fields, self.config.entry_ids())
    }

    /// Parses a roster out of an owning record's document.
    ///
    /// A document without the collection field is an empty roster.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] if the embedded field is present but
    /// malformed.
    pub fn roster_from_document(&self, record: &serde_json::Value) -> Result<Roster, DocumentError> {
        document::from_document(record, &self.fields)
    }
}

fn resolve_saved(roster: &Roster, address: &str) -> EmailEntry {
    roster
        .entry(address)
        .expect("entry resolved before saving")
        .clone()
}
