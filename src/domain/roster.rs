//! The in-memory email roster and its invariant-preserving operations.
//!
//! The [`Roster`] knows nothing about persistence or configuration. It
//! stores entries in insertion order (the only meaningful order; nothing is
//! ever sorted) and guarantees that at most one entry carries the primary
//! marker after any mutation, including failed ones.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entry::{EmailEntry, Selector};

/// An ordered collection of email entries embedded in an owning record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    entries: Vec<EmailEntry>,
}

/// Errors raised by roster and verification operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The targeted address has no entry in the roster.
    #[error("email address {0} does not exist")]
    NotFound(String),

    /// No entry carries the presented verification code.
    #[error("no email address matches verification code {0}")]
    UnknownCode(String),

    /// The operation requires a not-yet-verified entry.
    #[error("email address {0} is already verified")]
    AlreadyVerified(String),

    /// The presented verification code has expired.
    #[error("verification code for {0} has expired")]
    CodeExpired(String),
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EmailEntry> {
        self.entries.iter()
    }

    /// Finds an entry by address.
    ///
    /// Returns the first entry whose address matches the selector exactly.
    #[must_use]
    pub fn entry(&self, selector: impl Into<Selector>) -> Option<&EmailEntry> {
        let selector = selector.into();
        self.index_of(&selector).map(|index| &self.entries[index])
    }

    /// Whether an entry with the given address exists.
    #[must_use]
    pub fn contains(&self, selector: impl Into<Selector>) -> bool {
        self.entry(selector).is_some()
    }

    /// The current primary entry, if one is designated.
    #[must_use]
    pub fn primary(&self) -> Option<&EmailEntry> {
        self.entries.iter().find(|entry| entry.is_primary())
    }

    /// The address of the current primary entry, if one is designated.
    #[must_use]
    pub fn primary_address(&self) -> Option<&str> {
        self.primary().map(EmailEntry::address)
    }

    /// Whether the selector resolves to the current primary entry.
    ///
    /// Returns `false` when the selector matches no entry at all.
    #[must_use]
    pub fn is_primary(&self, selector: impl Into<Selector>) -> bool {
        self.entry(selector).is_some_and(EmailEntry::is_primary)
    }

    /// Finds the entry whose verification block carries the given code.
    ///
    /// Entries without a verification block never match.
    #[must_use]
    pub fn entry_by_code(&self, code: &str) -> Option<&EmailEntry> {
        self.index_of_code(code).map(|index| &self.entries[index])
    }

    /// Whether the selector resolves to a verified entry.
    #[must_use]
    pub fn is_verified(&self, selector: impl Into<Selector>) -> bool {
        self.entry(selector).is_some_and(EmailEntry::is_verified)
    }

    /// Designates an entry as the primary address.
    ///
    /// Idempotent: if the target is already primary it is returned
    /// unchanged, marker timestamp untouched. Otherwise the current
    /// primary's marker (if any) is cleared before the target is stamped,
    /// so two markers are never set, even transiently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no entry matches the selector.
    pub fn set_primary(&mut self, selector: impl Into<Selector>) -> Result<&EmailEntry, Error> {
        let selector = selector.into();
        let Some(target) = self.index_of(&selector) else {
            return Err(Error::NotFound(selector.into_address()));
        };

        if !self.entries[target].is_primary() {
            if let Some(current) = self.entries.iter_mut().find(|entry| entry.is_primary()) {
                current.primary = None;
            }
            self.entries[target].primary = Some(Utc::now());
            tracing::debug!(address = %self.entries[target].address, "primary email reassigned");
        }

        Ok(&self.entries[target])
    }

    /// Removes an entry, returning it.
    ///
    /// Removal is by identity of the resolved entry, not a second address
    /// lookup. A selector that matches nothing is a tolerated no-op
    /// (`None`), never an error. If the removed entry was the primary and
    /// entries remain without one, the new first entry is promoted.
    pub fn remove(&mut self, selector: impl Into<Selector>) -> Option<EmailEntry> {
        let index = self.index_of(&selector.into())?;
        let removed = self.entries.remove(index);

        if removed.is_primary() && !self.entries.is_empty() && self.primary().is_none() {
            let first = self.entries[0].address.clone();
            // the first entry necessarily resolves
            let _ = self.set_primary(first);
        }

        Some(removed)
    }

    /// Promotes the first entry to primary if the roster is non-empty and no
    /// entry currently holds the marker.
    ///
    /// This is the persistence-time default: stores call it immediately
    /// before validating a write, so that adding entries never assigns
    /// primary status eagerly. Returns whether a promotion happened.
    pub fn assign_default_primary(&mut self) -> bool {
        if self.primary().is_some() {
            return false;
        }
        self.entries.first_mut().is_some_and(|first| {
            first.primary = Some(Utc::now());
            tracing::debug!(address = %first.address, "first entry promoted to primary");
            true
        })
    }

    pub(crate) fn index_of(&self, selector: &Selector) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.address == selector.address())
    }

    pub(crate) fn index_of_code(&self, code: &str) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry
                .verification
                .as_ref()
                .is_some_and(|verification| verification.code == code)
        })
    }

    pub(crate) fn get_at(&self, index: usize) -> &EmailEntry {
        &self.entries[index]
    }

    pub(crate) fn get_at_mut(&mut self, index: usize) -> &mut EmailEntry {
        &mut self.entries[index]
    }

    pub(crate) fn push(&mut self, entry: EmailEntry) {
        self.entries.push(entry);
    }

    /// Counts the entries carrying a primary marker.
    ///
    /// A well-formed roster has at most one; the count is exposed so
    /// validators can reject externally constructed state.
    #[must_use]
    pub fn primary_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.is_primary())
            .count()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a EmailEntry;
    type IntoIter = std::slice::Iter<'a, EmailEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::Verification;

    fn roster_of(addresses: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for address in addresses {
            roster.push(EmailEntry::new((*address).to_owned(), None));
        }
        roster
    }

    #[test]
    fn entry_lookup_is_exact_and_case_sensitive() {
        let roster = roster_of(&["a@x.com", "b@x.com"]);
        assert!(roster.contains("a@x.com"));
        assert!(!roster.contains("A@x.com"));
        assert!(!roster.contains("c@x.com"));
    }

    #[test]
    fn entry_lookup_accepts_entry_like_values() {
        let roster = roster_of(&["a@x.com"]);
        let entry = roster.entry("a@x.com").unwrap().clone();
        assert_eq!(roster.entry(&entry).unwrap().address(), "a@x.com");
    }

    #[test]
    fn no_primary_until_designated() {
        let roster = roster_of(&["a@x.com", "b@x.com"]);
        assert!(roster.primary().is_none());
        assert!(roster.primary_address().is_none());
    }

    #[test]
    fn set_primary_designates_the_target() {
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        let entry = roster.set_primary("b@x.com").unwrap();
        assert_eq!(entry.address(), "b@x.com");
        assert_eq!(roster.primary_address(), Some("b@x.com"));
        assert!(!roster.is_primary("a@x.com"));
        assert_eq!(roster.primary_count(), 1);
    }

    #[test]
    fn set_primary_clears_the_previous_marker() {
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        roster.set_primary("a@x.com").unwrap();
        roster.set_primary("b@x.com").unwrap();
        assert!(!roster.is_primary("a@x.com"));
        assert!(roster.is_primary("b@x.com"));
        assert_eq!(roster.primary_count(), 1);
    }

    #[test]
    fn set_primary_is_idempotent() {
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        let first = roster.set_primary("a@x.com").unwrap().primary_since();
        let second = roster.set_primary("a@x.com").unwrap().primary_since();
        // the marker timestamp is untouched by the repeated call
        assert_eq!(first, second);
    }

    #[test]
    fn set_primary_unknown_address_fails() {
        let mut roster = roster_of(&["a@x.com"]);
        assert_eq!(
            roster.set_primary("b@x.com"),
            Err(Error::NotFound("b@x.com".to_owned()))
        );
        // the failure left no partial state behind
        assert!(roster.primary().is_none());
    }

    #[test]
    fn remove_drops_the_entry() {
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        let removed = roster.remove("a@x.com").unwrap();
        assert_eq!(removed.address(), "a@x.com");
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn remove_of_absent_entry_is_a_no_op() {
        let mut roster = roster_of(&["a@x.com"]);
        assert!(roster.remove("b@x.com").is_none());
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn removing_the_primary_promotes_the_next_oldest() {
        let mut roster = roster_of(&["a@x.com", "b@x.com", "c@x.com"]);
        roster.set_primary("a@x.com").unwrap();

        roster.remove("a@x.com").unwrap();

        // the pre-removal second-oldest survivor is the new primary
        assert_eq!(roster.primary_address(), Some("b@x.com"));
        assert_eq!(roster.primary_count(), 1);
    }

    #[test]
    fn removing_a_non_primary_leaves_the_primary_alone() {
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        roster.set_primary("a@x.com").unwrap();

        roster.remove("b@x.com").unwrap();

        assert_eq!(roster.primary_address(), Some("a@x.com"));
    }

    #[test]
    fn removing_the_last_entry_leaves_no_primary() {
        let mut roster = roster_of(&["a@x.com"]);
        roster.set_primary("a@x.com").unwrap();

        roster.remove("a@x.com").unwrap();

        assert!(roster.is_empty());
        assert!(roster.primary().is_none());
    }

    #[test]
    fn removing_a_non_primary_does_not_promote() {
        // no primary designated: removal of a non-primary must not promote
        // anything; promotion belongs to persistence time
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        roster.remove("b@x.com").unwrap();
        assert!(roster.primary().is_none());
    }

    #[test]
    fn assign_default_primary_promotes_the_first_entry() {
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        assert!(roster.assign_default_primary());
        assert_eq!(roster.primary_address(), Some("a@x.com"));
    }

    #[test]
    fn assign_default_primary_respects_an_existing_marker() {
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        roster.set_primary("b@x.com").unwrap();
        assert!(!roster.assign_default_primary());
        assert_eq!(roster.primary_address(), Some("b@x.com"));
    }

    #[test]
    fn assign_default_primary_on_empty_roster_does_nothing() {
        let mut roster = Roster::new();
        assert!(!roster.assign_default_primary());
    }

    #[test]
    fn entry_by_code_ignores_entries_without_verification() {
        let mut roster = roster_of(&["a@x.com", "b@x.com"]);
        roster.get_at_mut(1).verification = Some(Verification {
            code: "emvc-1".to_owned(),
            expires: None,
            confirmed: None,
        });

        assert_eq!(roster.entry_by_code("emvc-1").unwrap().address(), "b@x.com");
        assert!(roster.entry_by_code("emvc-2").is_none());
    }

    #[test]
    fn is_verified_is_false_for_pending_and_missing_entries() {
        let mut roster = roster_of(&["a@x.com"]);
        roster.get_at_mut(0).verification = Some(Verification {
            code: "emvc-1".to_owned(),
            expires: None,
            confirmed: None,
        });

        assert!(!roster.is_verified("a@x.com"));
        assert!(!roster.is_verified("b@x.com"));
    }
}
