//! Builder for configuring [`MemoryStorage`].

use std::sync::Arc;

use smol_str::SmolStr;

use crate::backend::{MemoryStorage, Quota};

/// Builder for creating and configuring a [`MemoryStorage`].
///
/// Use [`MemoryStorage::builder`] to create a new builder instance.
///
/// # Examples
///
/// ```
/// use shellcache_memory::MemoryStorage;
///
/// let storage = MemoryStorage::builder()
///     .max_bytes(10 * 1024 * 1024)
///     .label("pwa")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStorageBuilder {
    max_bytes: Option<usize>,
    label: SmolStr,
}

impl Default for MemoryStorageBuilder {
    fn default() -> Self {
        Self {
            max_bytes: None,
            label: SmolStr::new_static("memory"),
        }
    }
}

impl MemoryStorageBuilder {
    /// Limits the total approximate size of all partitions.
    ///
    /// Writes that would exceed the limit fail with
    /// [`StorageError::QuotaExceeded`](shellcache_backend::StorageError::QuotaExceeded).
    pub fn max_bytes(self, bytes: usize) -> Self {
        Self {
            max_bytes: Some(bytes),
            ..self
        }
    }

    /// Sets the label reported in logs.
    pub fn label(self, label: impl Into<SmolStr>) -> Self {
        Self {
            label: label.into(),
            ..self
        }
    }

    /// Builds the storage.
    pub fn build(self) -> MemoryStorage {
        MemoryStorage::from_parts(self.max_bytes.map(|limit| Arc::new(Quota::new(limit))), self.label)
    }
}
