//! Bounded list queries over any index view.
//!
//! A list query starts at a key (or at either end), walks the index in a
//! direction, stops after `limit` items and maps each item through a
//! projection. This is the shape every read-side listing endpoint takes.

use serde::{Deserialize, Serialize};

use slotdb_index::{Direction, IndexView};

use crate::error::{StoreError, StoreResult};

/// Largest `limit` a single list query may ask for.
pub const MAX_LIST_LIMIT: usize = 1000;

/// Where a list query starts, which way it walks, and how far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery<K> {
    /// First key to visit (inclusive). `None` starts at the first entry in
    /// `direction`.
    pub start: Option<K>,
    pub direction: Direction,
    pub limit: usize,
}

impl<K> ListQuery<K> {
    /// Walk from the beginning, ascending, returning at most `limit` items.
    pub fn new(limit: usize) -> Self {
        Self {
            start: None,
            direction: Direction::Ascending,
            limit,
        }
    }

    /// Start at `key` instead of the beginning.
    pub fn starting_at(mut self, key: K) -> Self {
        self.start = Some(key);
        self
    }

    /// Walk in descending key order.
    pub fn descending(mut self) -> Self {
        self.direction = Direction::Descending;
        self
    }
}

impl<K> Default for ListQuery<K> {
    fn default() -> Self {
        Self::new(MAX_LIST_LIMIT)
    }
}

/// Run `query` against `view`, projecting each value.
///
/// # Errors
///
/// [`StoreError::LimitExceeded`] if `query.limit` is above
/// [`MAX_LIST_LIMIT`]; [`StoreError::Index`] if the view cannot seek to
/// `query.start` (a hashed index).
pub fn list<'a, V, W, T, F>(view: &W, query: &ListQuery<W::Key>, projection: F) -> StoreResult<Vec<T>>
where
    V: 'a,
    W: IndexView<'a, V>,
    F: FnMut(&'a V) -> T,
{
    if query.limit > MAX_LIST_LIMIT {
        return Err(StoreError::LimitExceeded {
            requested: query.limit,
            max: MAX_LIST_LIMIT,
        });
    }
    let cursor = view.walk(query.start.as_ref(), query.direction)?;
    Ok(cursor.take(query.limit).map(projection).collect())
}
