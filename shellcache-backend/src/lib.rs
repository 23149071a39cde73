#![warn(missing_docs)]
//! Storage traits for shellcache.
//!
//! A [`CacheStorage`] is a set of named [`Partition`]s, each mapping a
//! [`RequestKey`](shellcache_core::RequestKey) to a stored
//! [`ResponseSnapshot`](shellcache_core::ResponseSnapshot). The dispatcher only
//! ever talks to these traits, so any store can back it: the in-memory
//! `shellcache-memory` crate, a disk store, or a fake in tests.
//!
//! If you want to implement your own storage, you're in the right place.

mod error;
mod partition;
mod storage;

pub use error::StorageError;
pub use partition::{Partition, PartitionHandle};
pub use storage::CacheStorage;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
