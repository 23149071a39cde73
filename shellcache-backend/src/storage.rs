use std::sync::Arc;

use async_trait::async_trait;
use shellcache_core::{RequestKey, ResponseSnapshot};
use smol_str::SmolStr;

use crate::{DeleteStatus, PartitionHandle, StorageResult};

/// A set of named partitions.
///
/// Partitions are created lazily by [`open`](CacheStorage::open); everything
/// else observes the existing set without creating anything.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the partition called `name`, creating it if needed.
    async fn open(&self, name: &str) -> StorageResult<PartitionHandle>;

    /// Whether a partition called `name` exists.
    async fn has(&self, name: &str) -> StorageResult<bool>;

    /// Names of all existing partitions.
    async fn keys(&self) -> StorageResult<Vec<SmolStr>>;

    /// Deletes the partition called `name` with all its entries.
    async fn delete(&self, name: &str) -> StorageResult<DeleteStatus>;

    /// Looks `key` up in the partition called `name` without creating it.
    async fn lookup_in(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> StorageResult<Option<ResponseSnapshot>> {
        if !self.has(name).await? {
            return Ok(None);
        }
        self.open(name).await?.lookup(key).await
    }

    /// Returns the name of this storage for logs.
    fn label(&self) -> &str {
        "storage"
    }
}

#[async_trait]
impl CacheStorage for Box<dyn CacheStorage> {
    async fn open(&self, name: &str) -> StorageResult<PartitionHandle> {
        (**self).open(name).await
    }

    async fn has(&self, name: &str) -> StorageResult<bool> {
        (**self).has(name).await
    }

    async fn keys(&self) -> StorageResult<Vec<SmolStr>> {
        (**self).keys().await
    }

    async fn delete(&self, name: &str) -> StorageResult<DeleteStatus> {
        (**self).delete(name).await
    }

    async fn lookup_in(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> StorageResult<Option<ResponseSnapshot>> {
        (**self).lookup_in(name, key).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

#[async_trait]
impl<T> CacheStorage for Arc<T>
where
    T: CacheStorage + ?Sized,
{
    async fn open(&self, name: &str) -> StorageResult<PartitionHandle> {
        (**self).open(name).await
    }

    async fn has(&self, name: &str) -> StorageResult<bool> {
        (**self).has(name).await
    }

    async fn keys(&self) -> StorageResult<Vec<SmolStr>> {
        (**self).keys().await
    }

    async fn delete(&self, name: &str) -> StorageResult<DeleteStatus> {
        (**self).delete(name).await
    }

    async fn lookup_in(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> StorageResult<Option<ResponseSnapshot>> {
        (**self).lookup_in(name, key).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}
