//! Id allocation and the free-list.
//!
//! Two policies, fixed when the container is built:
//!
//! - [`IdPolicy::Reuse`]: freed interior ids go on a LIFO free-list and are
//!   handed out again before the array grows. Freeing the tail id shrinks
//!   the slot array instead, so the free-list never holds the tail.
//! - [`IdPolicy::NoReuse`]: ids only ever increase. Freed slots stay holes.
//!   Needed when a rollback layer above the container relies on ids being
//!   monotonic.
//!
//! The allocator proposes a candidate id, and the container claims it only
//! once the object is actually stored. A rejected insert therefore leaks
//! nothing.

use serde::{Deserialize, Serialize};

/// Whether freed ids are recycled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdPolicy {
    #[default]
    Reuse,
    NoReuse,
}

/// What the slot array must do after an id is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// The id was the tail: drop the last position.
    ShrinkTail,
    /// Leave a hole at the id.
    Hole,
}

/// Id allocator for one container.
#[derive(Clone, Debug)]
pub struct IdAllocator {
    policy: IdPolicy,
    /// Reusable ids, most recently freed last. Reuse mode only.
    free: Vec<u64>,
    /// Highest id issued so far. No-reuse mode only.
    last_issued: u64,
}

impl IdAllocator {
    pub fn new(policy: IdPolicy) -> Self {
        Self {
            policy,
            free: Vec::new(),
            last_issued: 0,
        }
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }

    /// Reusable ids, most recently freed last.
    pub fn free_ids(&self) -> &[u64] {
        &self.free
    }

    /// The id the next insert will get, given the current live count.
    pub fn candidate(&self, live: usize) -> u64 {
        match self.policy {
            IdPolicy::Reuse => self.free.last().copied().unwrap_or(live as u64 + 1),
            IdPolicy::NoReuse => self.last_issued + 1,
        }
    }

    /// Commit the candidate after the object was stored. `live` is the live
    /// count *before* the insert.
    ///
    /// # Panics
    ///
    /// If `id` is not the current candidate. That means the container's
    /// bookkeeping is corrupt.
    pub fn claim(&mut self, id: u64, live: usize) {
        match self.policy {
            IdPolicy::Reuse => match self.free.last() {
                Some(&top) => {
                    assert_eq!(top, id, "claimed id must be the free-list top");
                    self.free.pop();
                }
                None => assert_eq!(
                    id,
                    live as u64 + 1,
                    "claimed id must extend the slot array by one"
                ),
            },
            IdPolicy::NoReuse => {
                assert_eq!(
                    id,
                    self.last_issued + 1,
                    "ids must be issued strictly in sequence"
                );
                self.last_issued = id;
            }
        }
    }

    /// Return `id` to the allocator. `tail` is the slot array's last id.
    pub fn release(&mut self, id: u64, tail: u64) -> Release {
        match self.policy {
            IdPolicy::Reuse if id == tail => Release::ShrinkTail,
            IdPolicy::Reuse => {
                self.free.push(id);
                Release::Hole
            }
            IdPolicy::NoReuse => Release::Hole,
        }
    }

    /// A hole is being filled directly (undo replay). Drop it from the
    /// free-list, or advance the counter past it.
    pub fn forget(&mut self, id: u64) {
        match self.policy {
            IdPolicy::Reuse => {
                if let Some(pos) = self.free.iter().rposition(|&free| free == id) {
                    self.free.remove(pos);
                }
            }
            IdPolicy::NoReuse => self.last_issued = self.last_issued.max(id),
        }
    }

    /// Checkpoint of the "next id" counter.
    pub fn save(&self) -> u64 {
        self.last_issued
    }

    /// Roll the counter back (or forward) to a checkpoint.
    pub fn restore(&mut self, last_issued: u64) {
        self.last_issued = last_issued;
    }

    /// Back to the freshly-constructed state.
    pub fn reset(&mut self) {
        self.free.clear();
        self.last_issued = 0;
    }
}
