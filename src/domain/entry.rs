use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single email address embedded in a record's roster.
///
/// The entry tracks the address itself, an optional primary marker, and an
/// optional verification block. The *presence* of the primary marker is what
/// designates the entry as primary; its timestamp records when the
/// designation was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailEntry {
    /// Per-entry identifier, assigned only when the configuration asks for
    /// one.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<Uuid>,

    /// The email address. Matched exactly, case-sensitive, no normalisation.
    #[serde(rename = "email_address")]
    pub(crate) address: String,

    /// Primary marker. `Some` means this entry is the current primary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) primary: Option<DateTime<Utc>>,

    /// Verification state. Absent until a verification is started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) verification: Option<Verification>,
}

impl EmailEntry {
    pub(crate) const fn new(address: String, id: Option<Uuid>) -> Self {
        Self {
            id,
            address,
            primary: None,
            verification: None,
        }
    }

    /// The per-entry identifier, if one was assigned.
    #[must_use]
    pub const fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// The email address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether this entry is the current primary for its roster.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// When this entry was designated primary, if it is the primary.
    #[must_use]
    pub const fn primary_since(&self) -> Option<DateTime<Utc>> {
        self.primary
    }

    /// The verification block, if a verification has been started.
    #[must_use]
    pub const fn verification(&self) -> Option<&Verification> {
        self.verification.as_ref()
    }

    /// Whether this entry has been verified (a confirmation timestamp is
    /// set).
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verification
            .as_ref()
            .is_some_and(Verification::is_confirmed)
    }
}

/// The verification lifecycle state of an [`EmailEntry`].
///
/// An entry moves `unset → pending → confirmed`: starting a verification
/// creates this block with a fresh code (pending), confirming it sets the
/// confirmation timestamp (terminal). Restarting while still pending
/// replaces the block wholesale, invalidating the previous code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// The opaque lookup code presented back to confirm the address.
    pub(crate) code: String,

    /// When the code stops being accepted. `None` means it never expires.
    #[serde(
        rename = "code_expiration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) expires: Option<DateTime<Utc>>,

    /// When the address was confirmed. `Some` means verified.
    #[serde(rename = "date", default, skip_serializing_if = "Option::is_none")]
    pub(crate) confirmed: Option<DateTime<Utc>>,
}

impl Verification {
    /// The verification code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// When the code expires, if an expiration was set.
    #[must_use]
    pub const fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// When the address was confirmed, if it has been.
    #[must_use]
    pub const fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed
    }

    /// Whether the address has been confirmed.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.confirmed.is_some()
    }

    /// Whether the code is expired at the given instant.
    ///
    /// Exactly-at-expiration counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

/// Identifies an existing entry by address.
///
/// Every accessor and mutator that targets an entry takes `impl
/// Into<Selector>`, so callers can pass a bare address (`&str` / `String`)
/// or anything carrying one (an [`EmailEntry`], a [`NewEntry`]). All
/// variants normalise to the address; matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    address: String,
}

impl Selector {
    /// The address this selector resolves against.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn into_address(self) -> String {
        self.address
    }
}

impl From<&str> for Selector {
    fn from(address: &str) -> Self {
        Self {
            address: address.to_owned(),
        }
    }
}

impl From<String> for Selector {
    fn from(address: String) -> Self {
        Self { address }
    }
}

impl From<&EmailEntry> for Selector {
    fn from(entry: &EmailEntry) -> Self {
        Self {
            address: entry.address.clone(),
        }
    }
}

impl From<&NewEntry> for Selector {
    fn from(entry: &NewEntry) -> Self {
        Self {
            address: entry.address.clone(),
        }
    }
}

/// An entry waiting to be added to a roster.
///
/// Typed counterpart of "a bare address or an object carrying one": new
/// entries always start without a primary marker or verification block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    address: String,
}

impl NewEntry {
    /// Creates a new entry from an address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// The address to be added.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn into_address(self) -> String {
        self.address
    }
}

impl From<&str> for NewEntry {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for NewEntry {
    fn from(address: String) -> Self {
        Self::new(address)
    }
}
