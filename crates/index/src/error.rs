//! Error types for index and mapper operations

use filemap_core::NormalizeError;
use thiserror::Error;

/// Errors surfaced by [`crate::PathIndex`] and [`crate::Mapper`].
#[derive(Debug, Error)]
pub enum IndexError {
    /// A value on either column is already mapped.
    #[error("mapping conflict: {logical} <-> {physical} overlaps an existing entry")]
    Conflict { logical: String, physical: String },

    /// Copy/move destination sits inside its own source subtree.
    #[error("destination {dst} is nested under source {src}")]
    NestedTarget { src: String, dst: String },

    /// Exact-match removal found nothing to remove.
    #[error("path is not mapped: {0}")]
    NotMapped(String),

    /// The path cannot be canonicalized.
    #[error(transparent)]
    InvalidPath(#[from] NormalizeError),

    /// Row (de)serialization failure.
    #[error("entry codec failure: {0}")]
    Codec(#[from] bincode::Error),

    /// Underlying sled failure.
    #[error("store failure: {0}")]
    Store(#[from] sled::Error),
}

/// Result type for index operations
pub type Result<T> = std::result::Result<T, IndexError>;
