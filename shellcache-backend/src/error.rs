//! Error types for storage operations.

use smol_str::SmolStr;
use thiserror::Error;

/// Error type for storage operations.
///
/// The dispatcher treats every storage error as best-effort: a failed read is
/// a miss and a failed write is skipped.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing would exceed the storage quota.
    #[error("quota exceeded writing {needed} bytes to partition `{partition}`")]
    QuotaExceeded {
        /// Partition being written.
        partition: SmolStr,
        /// Bytes the write needed.
        needed: usize,
    },

    /// The partition was deleted after this handle was opened.
    #[error("partition `{0}` was deleted")]
    PartitionDeleted(SmolStr),

    /// Internal storage error, state or computation error.
    ///
    /// Any error not related to I/O with an external store.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Error talking to an external store.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),
}
