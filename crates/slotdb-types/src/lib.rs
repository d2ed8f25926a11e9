//! Foundation types for slotdb.
//!
//! Every other slotdb crate depends on `slotdb-types`. It is deliberately
//! tiny: the typed identifier and the contract a stored value must satisfy.
//!
//! # Key Types
//!
//! - [`Oid`]: Integer identifier bound to a value type; `0` is null
//! - [`Object`]: A value that embeds the id it was assigned at construction

pub mod error;
pub mod oid;

pub use error::TypeError;
pub use oid::{Object, Oid};
