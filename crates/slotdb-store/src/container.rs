use std::fmt;

use tracing::{debug, error};

use slotdb_index::{IndexSelector, IndexSet};
use slotdb_types::{Object, Oid};

use crate::alloc::{IdAllocator, IdPolicy, Release};
use crate::by_id::{ById, ByIdIter, ByIdView};
use crate::config::StoreConfig;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, NoopSink};
use crate::error::{StoreError, StoreResult};
use crate::slots::SlotArray;

/// Random-access indexed container.
///
/// Every stored object gets a dense integer id at insert time and can be
/// found by it in O(1). The secondary indices in `I` are kept in step with
/// the slot array on every insert, modify and erase. Freed ids are reused
/// or not according to the container's [`IdPolicy`].
///
/// Contract violations (an id changed by `modify`, a reinsert into an
/// occupied slot, ...) are returned as fatal [`StoreError`]s and leave the
/// container untouched. Not-found is never an error.
pub struct IndexedContainer<V, I = ()> {
    slots: SlotArray<V>,
    ids: IdAllocator,
    indices: I,
    sink: Box<dyn DiagnosticSink>,
}

impl<V: Object + fmt::Debug, I: IndexSet<V>> IndexedContainer<V, I> {
    /// An empty container that reuses freed ids.
    pub fn new() -> Self {
        Self::with_policy(IdPolicy::Reuse)
    }

    /// An empty container with the given id policy.
    pub fn with_policy(policy: IdPolicy) -> Self {
        Self {
            slots: SlotArray::new(),
            ids: IdAllocator::new(policy),
            indices: I::default(),
            sink: Box::new(NoopSink),
        }
    }

    /// An empty container built from a configuration.
    pub fn with_config(config: &StoreConfig) -> Self {
        Self::with_policy(config.id_policy).with_sink(config.diagnostics.sink())
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The id policy fixed at construction.
    pub fn policy(&self) -> IdPolicy {
        self.ids.policy()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.slots.live_len()
    }

    /// Returns `true` if no object is live.
    pub fn is_empty(&self) -> bool {
        self.slots.live_len() == 0
    }

    /// Length of the slot array, null sentinel included.
    pub fn slot_len(&self) -> usize {
        self.slots.len()
    }

    /// Ids waiting to be reused, most recently freed last. Always empty in
    /// no-reuse mode.
    pub fn free_ids(&self) -> impl Iterator<Item = Oid<V>> + '_ {
        self.ids.free_ids().iter().map(|&raw| Oid::new(raw))
    }

    /// The secondary index set.
    pub fn indices(&self) -> &I {
        &self.indices
    }

    // -----------------------------------------------------------------------
    // Insert
    // -----------------------------------------------------------------------

    /// Insert the object `build` constructs for the next id.
    ///
    /// Returns `(id, true)` on success. If one of the object's keys is
    /// already held in a unique index, nothing is stored, the id is not
    /// consumed, and the result is `(holder, false)` where `holder` is the
    /// object holding the key.
    ///
    /// # Errors
    ///
    /// [`StoreError::ConstructorIdMismatch`] if the built object does not
    /// carry the id it was given.
    pub fn emplace<F>(&mut self, build: F) -> StoreResult<(Oid<V>, bool)>
    where
        F: FnOnce(Oid<V>) -> V,
    {
        let live = self.slots.live_len();
        let raw = self.ids.candidate(live);
        let id = Oid::new(raw);
        let value = build(id);

        if value.id() != id {
            error!(assigned = raw, built = value.id().get(), "constructor ignored assigned id");
            return Err(StoreError::ConstructorIdMismatch {
                assigned: raw,
                built: value.id().get(),
            });
        }

        if let Some(conflict) = self.indices.conflict(&value) {
            debug!(candidate = raw, index = conflict.index, holder = %conflict.holder, "emplace rejected: duplicate key");
            self.emit(|| DiagnosticEvent::Emplace {
                id: raw,
                holder: Some(conflict.holder.get()),
                inserted: false,
                dump: format!("{value:?}"),
                conflicts: self
                    .indices
                    .matches(&value)
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            });
            return Ok((conflict.holder, false));
        }

        self.indices.insert(&value);
        let stored = self.slots.set(id, value);
        assert!(stored, "allocated id {raw} must name a hole");
        self.ids.claim(raw, live);

        debug!(id = raw, "emplaced");
        self.emit(|| DiagnosticEvent::Emplace {
            id: raw,
            holder: None,
            inserted: true,
            dump: self.dump(id),
            conflicts: Vec::new(),
        });
        Ok((id, true))
    }

    /// Put back an object that carries its own id, typically one returned
    /// by [`erase`](Self::erase) and now being restored by an undo layer.
    ///
    /// The id must name a hole or the position right after the tail. A
    /// refilled hole leaves the free-list.
    ///
    /// # Errors
    ///
    /// Fatal: [`StoreError::NullIdentifier`], [`StoreError::SlotOccupied`]
    /// if the id is live, [`StoreError::IdOutOfRange`] if it lies further
    /// past the tail, [`StoreError::ReinsertConflict`] if a unique key is
    /// held by another object. The container is unchanged on error.
    pub fn reinsert_with_identity(&mut self, value: V) -> StoreResult<Oid<V>> {
        let id = value.id();
        if id.is_null() {
            error!("reinsert of object with null id");
            return Err(StoreError::NullIdentifier);
        }
        if self.slots.get(id).is_some() {
            error!(id = id.get(), "reinsert into occupied slot");
            return Err(StoreError::SlotOccupied { id: id.get() });
        }
        if !self.slots.accepts(id) {
            error!(id = id.get(), slot_len = self.slots.len(), "reinsert past slot array tail");
            return Err(StoreError::IdOutOfRange {
                id: id.get(),
                slot_len: self.slots.len(),
            });
        }
        if let Some(conflict) = self.indices.conflict(&value) {
            error!(id = id.get(), index = conflict.index, holder = %conflict.holder, "reinsert collides with unique key");
            return Err(StoreError::ReinsertConflict {
                id: id.get(),
                index: conflict.index,
                holder: conflict.holder.get(),
            });
        }

        self.ids.forget(id.get());

        self.indices.insert(&value);
        let stored = self.slots.set(id, value);
        assert!(stored, "reinsert target {id} must be a hole");

        debug!(id = id.get(), "reinserted");
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Modify / erase
    // -----------------------------------------------------------------------

    /// Apply `mutate` to the object with `id`.
    ///
    /// The mutation runs on a copy, which replaces the stored object only
    /// if every changed key is free in its unique index. Returns `Ok(false)`
    /// if `id` is not live or a key collides; the stored object is then
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Fatal [`StoreError::IdentifierChanged`] if `mutate` changed the id.
    pub fn modify<F>(&mut self, id: Oid<V>, mutate: F) -> StoreResult<bool>
    where
        V: Clone,
        F: FnOnce(&mut V),
    {
        let Some(current) = self.slots.get(id) else {
            return Ok(false);
        };
        let mut updated = current.clone();
        mutate(&mut updated);

        if updated.id() != id {
            error!(from = id.get(), to = updated.id().get(), "modify changed object id");
            return Err(StoreError::IdentifierChanged {
                from: id.get(),
                to: updated.id().get(),
            });
        }
        if let Some(conflict) = self.indices.replace_conflict(current, &updated) {
            debug!(id = id.get(), index = conflict.index, holder = %conflict.holder, "modify rejected: duplicate key");
            return Ok(false);
        }

        self.indices.replace(current, &updated);
        self.slots.replace(id, updated);
        Ok(true)
    }

    /// Remove the object with `id` and hand it back, or `None` if `id` is
    /// not live.
    ///
    /// In reuse mode the id is freed for the next insert; erasing the last
    /// slot shrinks the array instead.
    pub fn erase(&mut self, id: Oid<V>) -> Option<V> {
        self.slots.get(id)?;
        let tail = self.slots.tail() as u64;
        let value = match self.ids.release(id.get(), tail) {
            Release::ShrinkTail => self.slots.pop_tail(),
            Release::Hole => self.slots.clear(id),
        }?;
        self.indices.remove(&value);

        debug!(id = id.get(), "erased");
        self.emit(|| DiagnosticEvent::Erase {
            id: id.get(),
            dump: format!("{value:?}"),
        });
        Some(value)
    }

    /// Drop every object and reset id allocation.
    pub fn clear(&mut self) {
        let dropped = self.slots.live_len();
        self.slots.reset();
        self.ids.reset();
        self.indices.clear();
        debug!(dropped, "cleared");
        self.emit(|| DiagnosticEvent::Clear { dropped });
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// The live object with `id`.
    pub fn find(&self, id: Oid<V>) -> Option<&V> {
        let found = self.slots.get(id);
        self.emit(|| DiagnosticEvent::Lookup {
            id: id.get(),
            dump: found.map(|value| format!("{value:?}")),
        });
        found
    }

    /// Returns `true` if `id` is live.
    pub fn contains(&self, id: Oid<V>) -> bool {
        self.slots.get(id).is_some()
    }

    /// Live objects in id order.
    pub fn iter(&self) -> ByIdIter<'_, V> {
        ByIdView::new(&self.slots).values()
    }

    /// The view for index tag `T`: [`ById`] for the id dimension, or any
    /// tag declared in the index set.
    pub fn get_index<T: IndexSelector<V, I>>(&self) -> T::View<'_> {
        T::select(&self.indices, &self.slots)
    }

    /// The id dimension as a view. Same as `get_index::<ById>()`.
    pub fn by_id(&self) -> ByIdView<'_, V> {
        self.get_index::<ById>()
    }

    // -----------------------------------------------------------------------
    // Checkpoint
    // -----------------------------------------------------------------------

    /// The highest id issued so far (no-reuse mode). Always 0 in reuse mode.
    pub fn save_next_id(&self) -> u64 {
        self.ids.save()
    }

    /// Roll the id counter back to a value from
    /// [`save_next_id`](Self::save_next_id), truncating the slot array to
    /// match. A no-op in reuse mode.
    ///
    /// Objects issued after the checkpoint must already be erased.
    ///
    /// # Errors
    ///
    /// Fatal [`StoreError::RestoreAhead`] if `next` is above the highest id
    /// issued, [`StoreError::RestoreBelowLive`] if fewer ids than live
    /// objects would remain, [`StoreError::RestoreTruncatesLive`] if a live
    /// object has an id above `next`.
    pub fn restore_next_id(&mut self, next: u64) -> StoreResult<()> {
        if self.ids.policy() == IdPolicy::Reuse {
            debug!(next, "restore_next_id ignored in reuse mode");
            return Ok(());
        }

        let last_issued = self.ids.save();
        if next > last_issued {
            error!(requested = next, last_issued, "restore ahead of issued ids");
            return Err(StoreError::RestoreAhead { requested: next, last_issued });
        }
        let live = self.slots.live_len();
        if next < live as u64 {
            error!(requested = next, live, "restore below live count");
            return Err(StoreError::RestoreBelowLive { requested: next, live });
        }
        if let Some(highest) = self.slots.iter().next_back().map(Object::id) {
            if highest.get() > next {
                error!(requested = next, highest = highest.get(), "restore would drop live object");
                return Err(StoreError::RestoreTruncatesLive {
                    requested: next,
                    highest: highest.get(),
                });
            }
        }

        // next <= last_issued, so the array only shrinks.
        self.slots.resize(Oid::<V>::new(next).index() + 1);
        self.ids.restore(next);
        debug!(next, "next id restored");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    fn dump(&self, id: Oid<V>) -> String {
        self.slots
            .get(id)
            .map(|value| format!("{value:?}"))
            .unwrap_or_default()
    }

    #[cfg(feature = "diagnostics")]
    fn emit(&self, event: impl FnOnce() -> DiagnosticEvent) {
        if self.sink.enabled() {
            self.sink.record(&event());
        }
    }

    #[cfg(not(feature = "diagnostics"))]
    fn emit(&self, _event: impl FnOnce() -> DiagnosticEvent) {}
}

impl<V: Object + fmt::Debug, I: IndexSet<V>> Default for IndexedContainer<V, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, I: fmt::Debug> fmt::Debug for IndexedContainer<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedContainer")
            .field("slots", &self.slots)
            .field("ids", &self.ids)
            .field("indices", &self.indices)
            .finish_non_exhaustive()
    }
}
