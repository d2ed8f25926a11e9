//! Random-access indexed object storage for slotdb.
//!
//! An [`IndexedContainer`] stores every object once, under a dense integer
//! id it assigns at insert time, and keeps any number of secondary indices
//! over the same objects. It is the storage primitive beneath a state
//! machine whose entities (accounts, proposals, votes, ...) refer to each
//! other by id and whose mutations must be undoable.
//!
//! # Layout
//!
//! - [`slots`]: the id-addressed slot array that owns the objects
//! - [`alloc`]: id allocation, the free-list, and the two [`IdPolicy`] modes
//! - [`by_id`]: the slot array seen as an ordered unique index ([`ById`])
//! - [`container`]: the [`IndexedContainer`] facade
//! - [`query`]: bounded list queries over any index view
//! - [`diagnostics`]: optional event sinks (cargo feature `diagnostics`)
//!
//! # Design Rules
//!
//! 1. An object's id never changes while it is stored.
//! 2. Position 0 is the null id and never holds an object.
//! 3. In reuse mode every interior hole is on the free-list exactly once.
//! 4. In no-reuse mode ids only increase, so an undo layer can roll the
//!    counter back with [`IndexedContainer::restore_next_id`].
//! 5. Id lookups and index lookups return the same object: indices hold
//!    ids, never copies.
//! 6. A failed operation leaves the container as it was.

pub mod alloc;
pub mod by_id;
pub mod config;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod query;
pub mod slots;

// Re-export primary types at crate root for ergonomic imports.
pub use alloc::IdPolicy;
pub use by_id::{ById, ByIdIter, ByIdView};
pub use config::{DiagnosticsTarget, StoreConfig};
pub use container::IndexedContainer;
pub use diagnostics::{
    DiagnosticEvent, DiagnosticSink, FileSink, MemorySink, NoopSink, TracingSink,
};
pub use error::{StoreError, StoreResult};
pub use query::{list, ListQuery, MAX_LIST_LIMIT};

pub use slotdb_index::{
    indices, Conflict, Direction, IndexKind, IndexSelector, IndexSet, IndexTag, IndexView,
    SecondaryView,
};
pub use slotdb_types::{Object, Oid};
