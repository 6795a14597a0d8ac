//! Embedded multi-address email management for document records.
//!
//! A record owns an ordered roster of email addresses; at most one is the
//! designated primary, and each can run a verification-code workflow
//! (issue code, optional expiration, confirm). The [`Manager`] bundles
//! these operations under a [`Config`], and the [`storage`] boundary is
//! where an external document store plugs in.

pub mod domain;
pub use domain::{
    CodeGenerator, Config, EmailEntry, Error, FieldNames, FieldNaming, NewEntry, Roster, Selector,
    UuidCodeGenerator, Verification,
};

mod manager;
pub use manager::{Manager, SaveError};

/// The document-store boundary and external representation.
pub mod storage;
pub use storage::{EmailOwner, EmailStore, MemoryStore, SchemaSpec, StoreError, ValidationError};
