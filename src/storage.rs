//! The document-store boundary.
//!
//! The core never persists anything itself: it declares schema
//! requirements, validates rosters on behalf of stores, and delegates
//! single save calls through the [`EmailStore`] trait. [`MemoryStore`] is
//! the in-crate reference implementation of that contract.

/// External document representation and schema declaration.
pub mod document;
pub use document::{DocumentError, IndexDirection, IndexSpec, SchemaSpec, UniqueSpec};

mod memory;
pub use memory::{MemoryStore, Record};

mod store;
pub use store::{EmailOwner, EmailStore, StoreError, ValidationError, validate};
