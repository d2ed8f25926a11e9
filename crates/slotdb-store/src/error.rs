use slotdb_index::IndexError;

/// Errors from container operations.
///
/// Not-found is never an error: lookups return `None` and `modify` returns
/// `Ok(false)`. A duplicate key on `emplace` is reported in the returned
/// pair, not here. The remaining variants split into recoverable caller
/// errors and fatal contract violations; see [`StoreError::is_fatal`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Index-level failure (e.g. walking a hashed index from a key).
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// A list query asked for more items than a single query may return.
    #[error("query limit {requested} exceeds maximum {max}")]
    LimitExceeded { requested: usize, max: usize },

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A modification changed the object's embedded id.
    #[error("cannot change persistent object id: {from} -> {to}")]
    IdentifierChanged { from: u64, to: u64 },

    /// Reinsertion targeted a slot that still holds a live object.
    #[error("slot {id} is occupied; reinsertion requires a hole")]
    SlotOccupied { id: u64 },

    /// Reinsertion of an object carrying the null id.
    #[error("cannot store object with null id")]
    NullIdentifier,

    /// Reinsertion past the slot array's tail. Only a hole or the position
    /// right after the tail can be refilled.
    #[error("cannot reinsert object {id}: slot array ends at {slot_len}")]
    IdOutOfRange { id: u64, slot_len: usize },

    /// The constructor built an object that does not carry the assigned id.
    #[error("constructor ignored assigned id {assigned} and built {built}")]
    ConstructorIdMismatch { assigned: u64, built: u64 },

    /// Reinsertion collided with a unique index.
    #[error("cannot reinsert object {id}: key already held in `{index}` by {holder}")]
    ReinsertConflict {
        id: u64,
        index: &'static str,
        holder: u64,
    },

    /// Restoring the id counter below the number of live objects.
    #[error("cannot restore next id to {requested}: {live} objects are live")]
    RestoreBelowLive { requested: u64, live: usize },

    /// Restoring the id counter would cut off a live object.
    #[error("cannot restore next id to {requested}: object {highest} is still live")]
    RestoreTruncatesLive { requested: u64, highest: u64 },

    /// Restoring the id counter past any id this container has issued.
    #[error("cannot restore next id to {requested}: last issued id is {last_issued}")]
    RestoreAhead { requested: u64, last_issued: u64 },
}

impl StoreError {
    /// Returns `true` for contract violations: errors that mean the caller
    /// (typically an undo layer) has lost track of object identity and must
    /// not continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::IdentifierChanged { .. }
                | Self::SlotOccupied { .. }
                | Self::NullIdentifier
                | Self::IdOutOfRange { .. }
                | Self::ConstructorIdMismatch { .. }
                | Self::ReinsertConflict { .. }
                | Self::RestoreBelowLive { .. }
                | Self::RestoreTruncatesLive { .. }
                | Self::RestoreAhead { .. }
        )
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
