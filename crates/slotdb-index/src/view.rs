//! Read-only views over an index, and the tag-to-view dispatch.
//!
//! A container hands out views through [`IndexSelector`]: the tag type picks
//! the view type at compile time. Every view implements [`IndexView`], so
//! code that walks "the index tagged `X`" does not care whether `X` is a
//! secondary index or the container's own id dimension.

use serde::{Deserialize, Serialize};

use slotdb_types::Oid;

use crate::error::IndexResult;
use crate::index::SecondaryIndex;
use crate::tag::{IndexKind, IndexTag};

/// Boxed iterator over values yielded by a view.
pub type Cursor<'a, V> = Box<dyn Iterator<Item = &'a V> + 'a>;

/// Walk direction for [`IndexView::walk`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Storage that resolves ids to values. Implemented by the container's slot
/// array; indices only ever hold ids.
pub trait Resolve<V> {
    /// The live value with this id, if any.
    fn resolve(&self, id: Oid<V>) -> Option<&V>;

    /// One past the highest id that may resolve.
    fn slot_count(&self) -> usize;

    /// Number of ids that currently resolve.
    fn live_count(&self) -> usize;
}

/// A read-only index over values of type `V`.
pub trait IndexView<'a, V: 'a> {
    /// The key the index is ordered or hashed by.
    type Key;

    /// Index name.
    fn name(&self) -> &'static str;

    /// Index kind.
    fn kind(&self) -> IndexKind;

    /// Number of values reachable through the view.
    fn len(&self) -> usize;

    /// Returns `true` if the view yields nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every value, in index order.
    fn iter(&self) -> Cursor<'a, V>;

    /// The first value with `key`, if any.
    fn find(&self, key: &Self::Key) -> Option<&'a V>;

    /// Every value with `key`.
    fn equal_range(&self, key: &Self::Key) -> Cursor<'a, V>;

    /// Walk from `start` (inclusive, or the first/last entry when `None`)
    /// in `direction`.
    fn walk(&self, start: Option<&Self::Key>, direction: Direction) -> IndexResult<Cursor<'a, V>>;
}

/// Compile-time mapping from a tag type to the view a container returns
/// for it.
///
/// Implemented per tag by [`indices!`](crate::indices) and, for the id
/// dimension, by the container crate.
pub trait IndexSelector<V, I> {
    /// The view type for this tag.
    type View<'a>: IndexView<'a, V>
    where
        V: 'a,
        I: 'a;

    /// Build the view from the container's index set and storage.
    fn select<'a>(indices: &'a I, storage: &'a dyn Resolve<V>) -> Self::View<'a>
    where
        V: 'a;
}

/// View over one [`SecondaryIndex`], resolving ids through the container.
pub struct SecondaryView<'a, V, T: IndexTag<V>> {
    index: &'a SecondaryIndex<V, T>,
    storage: &'a dyn Resolve<V>,
}

impl<'a, V, T: IndexTag<V>> SecondaryView<'a, V, T> {
    pub fn new(index: &'a SecondaryIndex<V, T>, storage: &'a dyn Resolve<V>) -> Self {
        Self { index, storage }
    }

    /// The underlying index, for id-level access.
    pub fn index(&self) -> &'a SecondaryIndex<V, T> {
        self.index
    }
}

impl<V, T: IndexTag<V>> Clone for SecondaryView<'_, V, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, T: IndexTag<V>> Copy for SecondaryView<'_, V, T> {}

impl<'a, V: 'a, T: IndexTag<V>> IndexView<'a, V> for SecondaryView<'a, V, T> {
    type Key = T::Key;

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn kind(&self) -> IndexKind {
        T::KIND
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn iter(&self) -> Cursor<'a, V> {
        let (index, storage) = (self.index, self.storage);
        Box::new(index.ids().filter_map(move |id| storage.resolve(id)))
    }

    fn find(&self, key: &T::Key) -> Option<&'a V> {
        let storage = self.storage;
        self.index.holder(key).and_then(|id| storage.resolve(id))
    }

    fn equal_range(&self, key: &T::Key) -> Cursor<'a, V> {
        let (index, storage) = (self.index, self.storage);
        Box::new(index.equal_ids(key).filter_map(move |id| storage.resolve(id)))
    }

    fn walk(&self, start: Option<&T::Key>, direction: Direction) -> IndexResult<Cursor<'a, V>> {
        let (index, storage) = (self.index, self.storage);
        let ids = index.walk(start, direction)?;
        Ok(Box::new(ids.filter_map(move |id| storage.resolve(id))))
    }
}
