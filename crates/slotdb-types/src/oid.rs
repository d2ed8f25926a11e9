use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Typed identifier of an object stored in a slotdb container.
///
/// An `Oid<V>` is a plain integer bound to the value type `V` so that an
/// account id can never be passed where a proposal id is expected. The
/// integer doubles as the object's position in the container's slot array.
/// `0` is reserved: it is the null id and the slot array's sentinel.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Oid<V> {
    raw: u64,
    #[serde(skip)]
    _marker: PhantomData<fn() -> V>,
}

impl<V> Oid<V> {
    /// The largest representable id. Used as an upper bound by range scans.
    pub const MAX: Self = Self::new(u64::MAX);

    /// Wrap a raw integer. No range validation happens here.
    pub const fn new(raw: u64) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// The null id. Represents "no object".
    pub const fn null() -> Self {
        Self::new(0)
    }

    /// Returns `true` if this is the null id.
    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }

    /// The raw integer value.
    pub const fn get(&self) -> u64 {
        self.raw
    }

    /// The id as a slot-array position. Ids that do not fit in `usize`
    /// saturate to `usize::MAX`, which no slot array can reach.
    pub fn index(&self) -> usize {
        usize::try_from(self.raw).unwrap_or(usize::MAX)
    }

    /// Build an id from a slot-array position.
    pub fn from_index(index: usize) -> Self {
        Self::new(index as u64)
    }
}

// Manual impls: deriving would put bounds on `V`.

impl<V> Clone for Oid<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Oid<V> {}

impl<V> PartialEq for Oid<V> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<V> Eq for Oid<V> {}

impl<V> PartialOrd for Oid<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V> Ord for Oid<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<V> Hash for Oid<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<V> Default for Oid<V> {
    fn default() -> Self {
        Self::null()
    }
}

impl<V> fmt::Debug for Oid<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.raw)
    }
}

impl<V> fmt::Display for Oid<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<V> FromStr for Oid<V> {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self::new)
            .map_err(|e| TypeError::InvalidId(format!("{s:?}: {e}")))
    }
}

impl<V> From<u64> for Oid<V> {
    fn from(raw: u64) -> Self {
        Self::new(raw)
    }
}

impl<V> From<Oid<V>> for u64 {
    fn from(id: Oid<V>) -> Self {
        id.raw
    }
}

impl<V> From<usize> for Oid<V> {
    fn from(index: usize) -> Self {
        Self::from_index(index)
    }
}

impl<V> From<Oid<V>> for usize {
    fn from(id: Oid<V>) -> Self {
        id.index()
    }
}

/// A value that carries the id it was assigned at construction.
///
/// The id is set once, by the container, and must never change afterwards.
/// Containers verify this after every in-place modification.
pub trait Object: Sized {
    /// The id embedded in this value.
    fn id(&self) -> Oid<Self>;
}
