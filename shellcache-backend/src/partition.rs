use std::sync::Arc;

use async_trait::async_trait;
use shellcache_core::{RequestKey, ResponseSnapshot};

use crate::{DeleteStatus, StorageResult};

/// Shared handle to an open partition.
pub type PartitionHandle = Arc<dyn Partition>;

/// A named key-value store of response snapshots.
///
/// Writes are insert-or-overwrite; concurrent writes to one key resolve as
/// last writer wins.
#[async_trait]
pub trait Partition: Send + Sync {
    /// Partition name, including its version tag.
    fn name(&self) -> &str;

    /// Returns the stored response for `key`, if any.
    async fn lookup(&self, key: &RequestKey) -> StorageResult<Option<ResponseSnapshot>>;

    /// Stores `response` under `key`, replacing any previous entry.
    async fn put(&self, key: RequestKey, response: ResponseSnapshot) -> StorageResult<()>;

    /// Stores a batch of entries, all or nothing.
    ///
    /// If the batch cannot be written as a whole, no entry is written.
    async fn put_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>) -> StorageResult<()>;

    /// Removes the entry for `key`.
    async fn delete(&self, key: &RequestKey) -> StorageResult<DeleteStatus>;

    /// Lists stored keys, in no particular order.
    async fn keys(&self) -> StorageResult<Vec<RequestKey>>;
}

#[async_trait]
impl<T> Partition for Arc<T>
where
    T: Partition + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn lookup(&self, key: &RequestKey) -> StorageResult<Option<ResponseSnapshot>> {
        (**self).lookup(key).await
    }

    async fn put(&self, key: RequestKey, response: ResponseSnapshot) -> StorageResult<()> {
        (**self).put(key, response).await
    }

    async fn put_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>) -> StorageResult<()> {
        (**self).put_all(entries).await
    }

    async fn delete(&self, key: &RequestKey) -> StorageResult<DeleteStatus> {
        (**self).delete(key).await
    }

    async fn keys(&self) -> StorageResult<Vec<RequestKey>> {
        (**self).keys().await
    }
}
