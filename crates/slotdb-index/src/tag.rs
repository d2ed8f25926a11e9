//! Index specifications: the tag trait and the index kinds.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// How an index stores its keys and whether keys must be unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    OrderedUnique,
    OrderedNonUnique,
    HashedUnique,
    HashedNonUnique,
}

impl IndexKind {
    /// Returns `true` if two objects may not share a key.
    pub const fn is_unique(self) -> bool {
        matches!(self, Self::OrderedUnique | Self::HashedUnique)
    }

    /// Returns `true` if the index keeps its keys sorted.
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::OrderedUnique | Self::OrderedNonUnique)
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrderedUnique => write!(f, "ordered-unique"),
            Self::OrderedNonUnique => write!(f, "ordered-non-unique"),
            Self::HashedUnique => write!(f, "hashed-unique"),
            Self::HashedNonUnique => write!(f, "hashed-non-unique"),
        }
    }
}

/// Specification of one secondary index over values of type `V`.
///
/// Implemented on a zero-sized tag type. The tag names the index when it is
/// requested from a container, and carries the key extractor.
///
/// ```
/// use slotdb_index::{IndexKind, IndexTag};
///
/// struct Proposal { creator: String }
///
/// struct ByCreator;
///
/// impl IndexTag<Proposal> for ByCreator {
///     const NAME: &'static str = "by_creator";
///     const KIND: IndexKind = IndexKind::OrderedNonUnique;
///     type Key = String;
///
///     fn key(value: &Proposal) -> String {
///         value.creator.clone()
///     }
/// }
/// ```
pub trait IndexTag<V>: 'static {
    /// Name reported in diagnostics and errors.
    const NAME: &'static str;
    /// Storage and uniqueness of the index.
    const KIND: IndexKind;
    /// The extracted key.
    type Key: Ord + Hash + Clone + fmt::Debug;

    /// Extract the key of `value`.
    fn key(value: &V) -> Self::Key;
}
