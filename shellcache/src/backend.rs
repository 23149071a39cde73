//! Storage traits and types for plugging a cache store into the worker.
//!
//! This module re-exports types from `shellcache-backend`:
//!
//! - `CacheStorage` - a set of named partitions
//! - `Partition` - one partition: lookup, put, put_all, delete, keys
//! - `StorageError` - error type for storage operations
//! - `DeleteStatus` - result of a deletion
//!
//! ## Built-in storage
//!
//! | Storage | Crate | Use Case |
//! |---------|-------|----------|
//! | Memory | [`shellcache-memory`] | In-process, single instance |
//!
//! [`shellcache-memory`]: https://docs.rs/shellcache-memory

pub use shellcache_backend::{
    CacheStorage, DeleteStatus, Partition, PartitionHandle, StorageError, StorageResult,
};
