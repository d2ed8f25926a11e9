//! The by-id index: the slot array presented as an ordered unique index.
//!
//! Requesting [`ById`] from a container yields a [`ByIdView`], which walks
//! slot positions in id order and skips holes. It implements the same
//! [`IndexView`] trait as every secondary view, so generic code can treat
//! "index by id" like any other index.

use std::iter::FusedIterator;

use slotdb_index::{Cursor, Direction, IndexKind, IndexResult, IndexSelector, IndexView, Resolve};
use slotdb_types::Oid;

/// Tag naming the id dimension of a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ById;

impl ById {
    /// Name reported by the view.
    pub const NAME: &'static str = "by_id";
}

impl<V, I> IndexSelector<V, I> for ById {
    type View<'a> = ByIdView<'a, V>
    where
        V: 'a,
        I: 'a;

    fn select<'a>(_indices: &'a I, storage: &'a dyn Resolve<V>) -> Self::View<'a>
    where
        V: 'a,
    {
        ByIdView::new(storage)
    }
}

/// Read-only view over the slot array, keyed by id.
pub struct ByIdView<'a, V> {
    storage: &'a dyn Resolve<V>,
}

impl<'a, V> ByIdView<'a, V> {
    pub fn new(storage: &'a dyn Resolve<V>) -> Self {
        Self { storage }
    }

    /// Live objects with ids in `[from, to)`, ascending. Reverse it for a
    /// descending walk.
    pub fn range(&self, from: Oid<V>, to: Oid<V>) -> ByIdIter<'a, V> {
        let end = to.index().min(self.storage.slot_count());
        ByIdIter {
            storage: self.storage,
            front: from.index().max(1),
            back: end,
        }
    }

    /// Every live object, ascending.
    pub fn values(&self) -> ByIdIter<'a, V> {
        self.range(Oid::new(1), Oid::from_index(self.storage.slot_count()))
    }
}

impl<V> Clone for ByIdView<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ByIdView<'_, V> {}

impl<'a, V: 'a> IndexView<'a, V> for ByIdView<'a, V> {
    type Key = Oid<V>;

    fn name(&self) -> &'static str {
        ById::NAME
    }

    fn kind(&self) -> IndexKind {
        IndexKind::OrderedUnique
    }

    fn len(&self) -> usize {
        self.storage.live_count()
    }

    fn iter(&self) -> Cursor<'a, V> {
        Box::new(self.values())
    }

    fn find(&self, key: &Oid<V>) -> Option<&'a V> {
        let storage = self.storage;
        storage.resolve(*key)
    }

    fn equal_range(&self, key: &Oid<V>) -> Cursor<'a, V> {
        Box::new(self.find(key).into_iter())
    }

    fn walk(&self, start: Option<&Oid<V>>, direction: Direction) -> IndexResult<Cursor<'a, V>> {
        let slots = self.storage.slot_count();
        let cursor: Cursor<'a, V> = match (start, direction) {
            (None, Direction::Ascending) => Box::new(self.values()),
            (None, Direction::Descending) => Box::new(self.values().rev()),
            (Some(id), Direction::Ascending) => {
                Box::new(self.range(*id, Oid::from_index(slots)))
            }
            (Some(id), Direction::Descending) => {
                let to = Oid::from_index(id.index().saturating_add(1));
                Box::new(self.range(Oid::new(1), to).rev())
            }
        };
        Ok(cursor)
    }
}

/// Lazy walk over slot positions `[front, back)`, yielding live objects.
///
/// Cloning restarts from the clone's position. Invalidated (at compile time,
/// by the borrow) by any mutation of the container.
pub struct ByIdIter<'a, V> {
    storage: &'a dyn Resolve<V>,
    front: usize,
    back: usize,
}

impl<V> Clone for ByIdIter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, V> Iterator for ByIdIter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        while self.front < self.back {
            let id = Oid::from_index(self.front);
            self.front += 1;
            if let Some(value) = self.storage.resolve(id) {
                return Some(value);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.back.saturating_sub(self.front)))
    }
}

impl<V> DoubleEndedIterator for ByIdIter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            self.back -= 1;
            if let Some(value) = self.storage.resolve(Oid::from_index(self.back)) {
                return Some(value);
            }
        }
        None
    }
}

impl<V> FusedIterator for ByIdIter<'_, V> {}
