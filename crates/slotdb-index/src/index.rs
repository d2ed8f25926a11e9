//! A single secondary index: `(key, id)` pairs for one [`IndexTag`].
//!
//! The index never owns values. It stores the key extracted from each value
//! next to the value's [`Oid`], and callers resolve ids back to values
//! through their own storage (see [`crate::Resolve`]).
//!
//! Ordered kinds keep a `BTreeSet<(key, id)>`, so entries with equal keys
//! are ordered by id. Hashed kinds keep a `HashMap<key, Vec<id>>` with each
//! bucket sorted by id.

use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;
use std::ops::Bound;

use tracing::trace;

use slotdb_types::{Object, Oid};

use crate::error::{IndexError, IndexResult};
use crate::set::Conflict;
use crate::tag::{IndexKind, IndexTag};
use crate::view::Direction;

/// Iterator over ids, boxed so ordered and hashed storage share one type.
pub type IdIter<'a, V> = Box<dyn Iterator<Item = Oid<V>> + 'a>;

enum Entries<K, V> {
    Ordered(BTreeSet<(K, Oid<V>)>),
    Hashed(HashMap<K, Vec<Oid<V>>>),
}

/// One secondary index over values of type `V`, specified by tag `T`.
pub struct SecondaryIndex<V, T: IndexTag<V>> {
    entries: Entries<T::Key, V>,
    len: usize,
    _tag: PhantomData<fn() -> T>,
}

impl<V, T: IndexTag<V>> SecondaryIndex<V, T> {
    /// Create an empty index with the storage `T::KIND` asks for.
    pub fn new() -> Self {
        let entries = if T::KIND.is_ordered() {
            Entries::Ordered(BTreeSet::new())
        } else {
            Entries::Hashed(HashMap::new())
        };
        Self {
            entries,
            len: 0,
            _tag: PhantomData,
        }
    }

    /// The tag's name.
    pub fn name(&self) -> &'static str {
        T::NAME
    }

    /// The tag's kind.
    pub fn kind(&self) -> IndexKind {
        T::KIND
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        match &mut self.entries {
            Entries::Ordered(set) => set.clear(),
            Entries::Hashed(map) => map.clear(),
        }
        self.len = 0;
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// The lowest id indexed under `key`.
    pub fn holder(&self, key: &T::Key) -> Option<Oid<V>> {
        self.equal_ids(key).next()
    }

    /// All ids indexed under `key`, in ascending id order.
    pub fn equal_ids(&self, key: &T::Key) -> IdIter<'_, V> {
        match &self.entries {
            Entries::Ordered(set) => {
                let lo = (key.clone(), Oid::null());
                let hi = (key.clone(), Oid::MAX);
                Box::new(
                    set.range((Bound::Included(lo), Bound::Included(hi)))
                        .map(|(_, id)| *id),
                )
            }
            Entries::Hashed(map) => match map.get(key) {
                Some(ids) => Box::new(ids.iter().copied()),
                None => Box::new(std::iter::empty()),
            },
        }
    }

    /// Every indexed id. Ordered indices yield key order; hashed indices
    /// yield an unspecified but stable order until the next mutation.
    pub fn ids(&self) -> IdIter<'_, V> {
        match &self.entries {
            Entries::Ordered(set) => Box::new(set.iter().map(|(_, id)| *id)),
            Entries::Hashed(map) => Box::new(map.values().flat_map(|ids| ids.iter().copied())),
        }
    }

    /// Walk the index from `start` (inclusive) in `direction`.
    ///
    /// Ascending from `k` begins at the first entry with key `>= k`;
    /// descending from `k` begins at the last entry with key `<= k`. With no
    /// start key the whole index is walked. Hashed indices can only be
    /// walked without a start key.
    pub fn walk(&self, start: Option<&T::Key>, direction: Direction) -> IndexResult<IdIter<'_, V>> {
        match &self.entries {
            Entries::Ordered(set) => {
                let ids: IdIter<'_, V> = match (start, direction) {
                    (None, Direction::Ascending) => Box::new(set.iter().map(|(_, id)| *id)),
                    (None, Direction::Descending) => {
                        Box::new(set.iter().rev().map(|(_, id)| *id))
                    }
                    (Some(key), Direction::Ascending) => Box::new(
                        set.range((Bound::Included((key.clone(), Oid::null())), Bound::Unbounded))
                            .map(|(_, id)| *id),
                    ),
                    (Some(key), Direction::Descending) => Box::new(
                        set.range((Bound::Unbounded, Bound::Included((key.clone(), Oid::MAX))))
                            .rev()
                            .map(|(_, id)| *id),
                    ),
                };
                Ok(ids)
            }
            Entries::Hashed(_) => match start {
                None => Ok(self.ids()),
                Some(_) => Err(IndexError::Unordered { index: T::NAME }),
            },
        }
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    fn insert_entry(&mut self, key: T::Key, id: Oid<V>) {
        let added = match &mut self.entries {
            Entries::Ordered(set) => set.insert((key, id)),
            Entries::Hashed(map) => {
                let ids = map.entry(key).or_default();
                match ids.binary_search(&id) {
                    Ok(_) => false,
                    Err(pos) => {
                        ids.insert(pos, id);
                        true
                    }
                }
            }
        };
        if added {
            self.len += 1;
        }
    }

    fn remove_entry(&mut self, key: &T::Key, id: Oid<V>) -> bool {
        let removed = match &mut self.entries {
            Entries::Ordered(set) => set.remove(&(key.clone(), id)),
            Entries::Hashed(map) => {
                let Some(ids) = map.get_mut(key) else {
                    return false;
                };
                let removed = match ids.binary_search(&id) {
                    Ok(pos) => {
                        ids.remove(pos);
                        true
                    }
                    Err(_) => false,
                };
                if ids.is_empty() {
                    map.remove(key);
                }
                removed
            }
        };
        if removed {
            self.len -= 1;
        }
        removed
    }
}

impl<V: Object, T: IndexTag<V>> SecondaryIndex<V, T> {
    /// The object that would block inserting `value`, if this index is
    /// unique and already holds its key under another id.
    pub fn conflict(&self, value: &V) -> Option<Conflict<V>> {
        if !T::KIND.is_unique() {
            return None;
        }
        self.blocking(&T::key(value), value.id())
    }

    /// Like [`conflict`](Self::conflict), but only for the key `new` would
    /// move to. An unchanged key never conflicts.
    pub fn replace_conflict(&self, old: &V, new: &V) -> Option<Conflict<V>> {
        if !T::KIND.is_unique() {
            return None;
        }
        let key = T::key(new);
        if key == T::key(old) {
            return None;
        }
        self.blocking(&key, new.id())
    }

    /// Report this index if it already holds `value`'s key under another
    /// id, unique or not. Used for diagnostics.
    pub fn matching(&self, value: &V) -> Option<Conflict<V>> {
        self.blocking(&T::key(value), value.id())
    }

    /// Index `value` under its current key.
    pub fn insert(&mut self, value: &V) {
        self.insert_entry(T::key(value), value.id());
    }

    /// Remove `value`'s entry. Returns `false` if it was not indexed.
    pub fn remove(&mut self, value: &V) -> bool {
        self.remove_entry(&T::key(value), value.id())
    }

    /// Move the entry of an object from `old`'s key to `new`'s key.
    pub fn reindex(&mut self, old: &V, new: &V) {
        let (old_key, new_key) = (T::key(old), T::key(new));
        if old_key == new_key && old.id() == new.id() {
            return;
        }
        self.remove_entry(&old_key, old.id());
        trace!(index = T::NAME, id = %new.id(), "re-indexed");
        self.insert_entry(new_key, new.id());
    }

    fn blocking(&self, key: &T::Key, owner: Oid<V>) -> Option<Conflict<V>> {
        self.equal_ids(key)
            .find(|holder| *holder != owner)
            .map(|holder| Conflict {
                index: T::NAME,
                kind: T::KIND,
                holder,
            })
    }
}

impl<V, T: IndexTag<V>> Default for SecondaryIndex<V, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, T: IndexTag<V>> std::fmt::Debug for SecondaryIndex<V, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryIndex")
            .field("name", &T::NAME)
            .field("kind", &T::KIND)
            .field("len", &self.len)
            .finish()
    }
}
