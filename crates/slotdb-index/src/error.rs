//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A positional walk was requested on a hashed index.
    #[error("index `{index}` is hashed and cannot be walked from a key")]
    Unordered { index: &'static str },
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
