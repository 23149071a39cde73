//! In-memory [`CacheStorage`](shellcache_backend::CacheStorage) for shellcache.
//!
//! [`MemoryStorage`] keeps every partition in a [`dashmap::DashMap`], so reads
//! and writes to different keys never contend on a global lock. An optional
//! byte quota, shared by all partitions, mimics the per-origin storage quota
//! of a browser and makes quota failures testable.
//!
//! ```
//! use shellcache_memory::MemoryStorage;
//!
//! let storage = MemoryStorage::builder().max_bytes(50 * 1024 * 1024).build();
//! # let _ = storage;
//! ```
#![warn(missing_docs)]

mod backend;
mod builder;

pub use backend::{MemoryPartition, MemoryStorage};
pub use builder::MemoryStorageBuilder;
