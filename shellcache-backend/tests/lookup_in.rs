//! Default `CacheStorage::lookup_in` behavior.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shellcache_backend::{
    CacheStorage, DeleteStatus, Partition, PartitionHandle, StorageError, StorageResult,
};
use shellcache_core::{RequestKey, ResponseSnapshot};
use smol_str::SmolStr;

#[derive(Default)]
struct Entries {
    name: SmolStr,
    map: Mutex<HashMap<RequestKey, ResponseSnapshot>>,
}

#[async_trait]
impl Partition for Entries {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> StorageResult<Option<ResponseSnapshot>> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: RequestKey, response: ResponseSnapshot) -> StorageResult<()> {
        self.map.lock().unwrap().insert(key, response);
        Ok(())
    }

    async fn put_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>) -> StorageResult<()> {
        self.map.lock().unwrap().extend(entries);
        Ok(())
    }

    async fn delete(&self, key: &RequestKey) -> StorageResult<DeleteStatus> {
        Ok(match self.map.lock().unwrap().remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn keys(&self) -> StorageResult<Vec<RequestKey>> {
        Ok(self.map.lock().unwrap().keys().cloned().collect())
    }
}

/// Storage implementing only the required methods.
#[derive(Default)]
struct TestStorage {
    partitions: Mutex<HashMap<SmolStr, Arc<Entries>>>,
    broken: bool,
}

#[async_trait]
impl CacheStorage for TestStorage {
    async fn open(&self, name: &str) -> StorageResult<PartitionHandle> {
        let mut partitions = self.partitions.lock().unwrap();
        let partition = partitions.entry(SmolStr::new(name)).or_insert_with(|| {
            Arc::new(Entries {
                name: SmolStr::new(name),
                ..Default::default()
            })
        });
        Ok(partition.clone())
    }

    async fn has(&self, name: &str) -> StorageResult<bool> {
        if self.broken {
            return Err(StorageError::ConnectionError("unreachable".into()));
        }
        Ok(self.partitions.lock().unwrap().contains_key(name))
    }

    async fn keys(&self) -> StorageResult<Vec<SmolStr>> {
        Ok(self.partitions.lock().unwrap().keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> StorageResult<DeleteStatus> {
        Ok(match self.partitions.lock().unwrap().remove(name) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }
}

/// Test 1: looking into a missing partition does not create it
#[tokio::test]
async fn test_lookup_in_missing_partition() {
    let storage = TestStorage::default();

    let found = storage
        .lookup_in("leapmultix-offline-v8", &RequestKey::get("/offline.html"))
        .await
        .unwrap();

    assert!(found.is_none());
    assert!(storage.keys().await.unwrap().is_empty());
}

/// Test 2: an existing partition answers through the default method
#[tokio::test]
async fn test_lookup_in_existing_partition() {
    let storage = TestStorage::default();
    storage
        .open("leapmultix-offline-v8")
        .await
        .unwrap()
        .put(RequestKey::get("/offline.html"), ResponseSnapshot::ok("offline"))
        .await
        .unwrap();

    let found = storage
        .lookup_in("leapmultix-offline-v8", &RequestKey::get("/offline.html"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.body(), "offline");
}

/// Test 3: storage errors surface to the caller
#[tokio::test]
async fn test_lookup_in_propagates_errors() {
    let storage = TestStorage {
        broken: true,
        ..Default::default()
    };

    let result = storage
        .lookup_in("leapmultix-offline-v8", &RequestKey::get("/offline.html"))
        .await;

    assert!(matches!(result, Err(StorageError::ConnectionError(_))));
}

/// Test 4: boxed storages and `Arc` partitions forward to the inner value
#[tokio::test]
async fn test_erased_storage_forwards() {
    let storage: Box<dyn CacheStorage> = Box::new(TestStorage::default());
    let partition = storage.open("leapmultix-runtime-v8").await.unwrap();
    partition
        .put(RequestKey::get("/js/main.js"), ResponseSnapshot::ok("main"))
        .await
        .unwrap();

    assert!(storage.has("leapmultix-runtime-v8").await.unwrap());
    assert_eq!(partition.name(), "leapmultix-runtime-v8");
    assert_eq!(
        storage.delete("leapmultix-runtime-v8").await.unwrap(),
        DeleteStatus::Deleted(1)
    );
}
