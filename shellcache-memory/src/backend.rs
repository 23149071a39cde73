//! DashMap storage implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shellcache_backend::{
    CacheStorage, DeleteStatus, Partition, PartitionHandle, StorageError, StorageResult,
};
use shellcache_core::{RequestKey, ResponseSnapshot};
use smol_str::SmolStr;
use tracing::debug;

/// Byte budget shared by all partitions of one storage.
#[derive(Debug)]
pub(crate) struct Quota {
    limit: usize,
    used: AtomicUsize,
}

impl Quota {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    fn try_reserve(&self, bytes: usize) -> bool {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|total| *total <= self.limit)
            })
            .is_ok()
    }

    fn release(&self, bytes: usize) {
        let _ = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(bytes))
            });
    }

    fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }
}

fn entry_size(key: &RequestKey, response: &ResponseSnapshot) -> usize {
    key.memory_size() + response.memory_size()
}

/// A partition held in memory.
///
/// Once the storage deletes it, handles still held by callers refuse writes
/// with [`StorageError::PartitionDeleted`].
#[derive(Debug)]
pub struct MemoryPartition {
    name: SmolStr,
    entries: DashMap<RequestKey, ResponseSnapshot>,
    quota: Option<Arc<Quota>>,
    deleted: AtomicBool,
}

impl MemoryPartition {
    fn new(name: SmolStr, quota: Option<Arc<Quota>>) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            quota,
            deleted: AtomicBool::new(false),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the partition holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reserve(&self, bytes: usize) -> StorageResult<()> {
        match &self.quota {
            Some(quota) if !quota.try_reserve(bytes) => Err(StorageError::QuotaExceeded {
                partition: self.name.clone(),
                needed: bytes,
            }),
            _ => Ok(()),
        }
    }

    fn release(&self, bytes: usize) {
        if let Some(quota) = &self.quota {
            quota.release(bytes);
        }
    }

    // Checked under the shard lock of the written entry: `retire` sets the
    // flag before draining, so every write either lands before the drain
    // reaches its shard or sees the flag.
    fn ensure_live(&self) -> StorageResult<()> {
        if self.deleted.load(Ordering::Acquire) {
            Err(StorageError::PartitionDeleted(self.name.clone()))
        } else {
            Ok(())
        }
    }

    /// Stores an entry whose full size is already reserved.
    fn insert_reserved(&self, key: RequestKey, response: ResponseSnapshot) -> StorageResult<()> {
        let reserved = entry_size(&key, &response);
        match self.entries.entry(key) {
            _ if self.deleted.load(Ordering::Acquire) => {
                self.release(reserved);
                Err(StorageError::PartitionDeleted(self.name.clone()))
            }
            Entry::Occupied(mut entry) => {
                let previous = entry.insert(response);
                self.release(entry.key().memory_size() + previous.memory_size());
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(response);
                Ok(())
            }
        }
    }

    /// Refuses further writes and drops every entry, returning how many
    /// there were.
    fn retire(&self) -> usize {
        self.deleted.store(true, Ordering::Release);
        let mut drained = 0;
        self.entries.retain(|key, response| {
            self.release(entry_size(key, response));
            drained += 1;
            false
        });
        drained
    }
}

#[async_trait]
impl Partition for MemoryPartition {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> StorageResult<Option<ResponseSnapshot>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: RequestKey, response: ResponseSnapshot) -> StorageResult<()> {
        let size = response.memory_size();
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                self.ensure_live()?;
                let previous = entry.get().memory_size();
                if size > previous {
                    self.reserve(size - previous)?;
                } else {
                    self.release(previous - size);
                }
                entry.insert(response);
            }
            Entry::Vacant(entry) => {
                self.ensure_live()?;
                self.reserve(entry.key().memory_size() + size)?;
                entry.insert(response);
            }
        }
        Ok(())
    }

    async fn put_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>) -> StorageResult<()> {
        self.ensure_live()?;
        let needed = entries
            .iter()
            .map(|(key, response)| entry_size(key, response))
            .sum();
        self.reserve(needed)?;
        let mut outcome = Ok(());
        for (key, response) in entries {
            if let Err(error) = self.insert_reserved(key, response) {
                outcome = Err(error);
            }
        }
        outcome
    }

    async fn delete(&self, key: &RequestKey) -> StorageResult<DeleteStatus> {
        match self.entries.remove(key) {
            Some((key, response)) => {
                self.release(entry_size(&key, &response));
                Ok(DeleteStatus::Deleted(1))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self) -> StorageResult<Vec<RequestKey>> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }
}

/// In-memory cache storage.
///
/// Cloning is cheap and clones share the same partitions.
///
/// # Caveats
///
/// - Data is **not persisted**: partitions are lost on process restart
/// - The quota counts approximate heap usage, not exact allocation sizes
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    partitions: Arc<DashMap<SmolStr, Arc<MemoryPartition>>>,
    quota: Option<Arc<Quota>>,
    label: SmolStr,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an unbounded storage.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new builder for `MemoryStorage`.
    pub fn builder() -> crate::builder::MemoryStorageBuilder {
        crate::builder::MemoryStorageBuilder::default()
    }

    pub(crate) fn from_parts(quota: Option<Arc<Quota>>, label: SmolStr) -> Self {
        Self {
            partitions: Arc::new(DashMap::new()),
            quota,
            label,
        }
    }

    /// Returns the partition called `name` without creating it.
    pub fn partition(&self, name: &str) -> Option<Arc<MemoryPartition>> {
        self.partitions.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Bytes currently counted against the quota, if one is configured.
    pub fn used_bytes(&self) -> Option<usize> {
        self.quota.as_ref().map(|quota| quota.used())
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> StorageResult<PartitionHandle> {
        let partition: PartitionHandle = self
            .partitions
            .entry(SmolStr::new(name))
            .or_insert_with(|| {
                debug!(partition = name, "creating partition");
                Arc::new(MemoryPartition::new(SmolStr::new(name), self.quota.clone()))
            })
            .clone();
        Ok(partition)
    }

    async fn has(&self, name: &str) -> StorageResult<bool> {
        Ok(self.partitions.contains_key(name))
    }

    async fn keys(&self) -> StorageResult<Vec<SmolStr>> {
        Ok(self
            .partitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> StorageResult<DeleteStatus> {
        match self.partitions.remove(name) {
            Some((_, partition)) => {
                let entries = u32::try_from(partition.retire()).unwrap_or(u32::MAX);
                debug!(partition = name, entries, "deleted partition");
                Ok(DeleteStatus::Deleted(entries))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}
