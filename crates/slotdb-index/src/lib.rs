//! Secondary-index engine for slotdb.
//!
//! A container stores each object once, addressed by its [`Oid`]. This crate
//! maintains the other ways of finding those objects: ordered or hashed,
//! unique or non-unique indices keyed by a field extracted from the object.
//!
//! Indices hold `(key, id)` pairs only. Values are resolved back through the
//! container's storage via [`Resolve`], so an id lookup and a key lookup
//! always return the same object.
//!
//! # Pieces
//!
//! - [`IndexTag`]: one index specification: name, [`IndexKind`], key extractor
//! - [`SecondaryIndex`]: storage for one tag
//! - [`IndexSet`]: all indices of a container; declared with [`indices!`]
//! - [`IndexView`] / [`SecondaryView`]: read-only, resolving views
//! - [`IndexSelector`]: compile-time dispatch from tag to view
//!
//! [`Oid`]: slotdb_types::Oid

pub mod error;
pub mod index;
pub mod set;
pub mod tag;
pub mod view;

pub use error::{IndexError, IndexResult};
pub use index::{IdIter, SecondaryIndex};
pub use set::{Conflict, IndexSet};
pub use tag::{IndexKind, IndexTag};
pub use view::{Cursor, Direction, IndexSelector, IndexView, Resolve, SecondaryView};
