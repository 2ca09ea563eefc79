//! Error types for the arcadia catalog.

use thiserror::Error;

/// Result type alias using arcadia's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for catalog operations.
///
/// Expected outcomes such as duplicate content or a missing key are not
/// errors; they are reported through the outcome enums in
/// [`crate::models`]. This type covers the cases that genuinely abort an
/// operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A tag list supplied on insert or update was empty or contained an
    /// empty entry. Rejected before any store access.
    #[error("tag list must be non-empty and contain no empty entries")]
    InvalidTag,

    /// A stored record could not be decoded back into a typed record,
    /// usually because its persisted tag list failed to parse. The query
    /// that touched the record aborts rather than producing partial output.
    #[error("malformed record {key:?}: {reason}")]
    MalformedRecord { key: String, reason: String },

    /// Underlying SQLite failure, propagated as-is. Retries, if any, are a
    /// store concern, not handled at this layer.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl Error {
    /// Builds a [`Error::MalformedRecord`] for the record identified by its
    /// content key.
    pub(crate) fn malformed(key: &str, reason: impl ToString) -> Self {
        Error::MalformedRecord {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}
