//! Test doubles shared by the worker integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::{Ready, ready};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use shellcache::backend::{
    CacheStorage, DeleteStatus, Partition, PartitionHandle, StorageError, StorageResult,
};
use shellcache::{
    FetchRequest, NetworkError, NetworkResult, Origin, RequestKey, ResponseSnapshot, Upstream,
    WorkerConfig,
};
use shellcache_memory::MemoryStorage;
use smol_str::SmolStr;

pub const ORIGIN: &str = "https://leapmultix.org";

pub fn origin() -> Origin {
    Origin::parse(ORIGIN).unwrap()
}

pub fn config() -> WorkerConfig {
    WorkerConfig::new(origin())
}

#[derive(Clone)]
enum Reply {
    Respond(ResponseSnapshot),
    Fail,
}

#[derive(Default)]
struct MockState {
    replies: HashMap<String, Reply>,
    calls: Vec<String>,
    offline: bool,
}

/// Scripted network.
///
/// Replies are keyed by path; unknown paths answer `404`. Every call is
/// recorded, clones share the script and the call log.
#[derive(Clone, Default)]
pub struct MockUpstream {
    state: Arc<Mutex<MockState>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `path` with `status` and `body`.
    pub fn respond(&self, path: &str, status: StatusCode, body: &'static str) -> &Self {
        self.state.lock().unwrap().replies.insert(
            path.to_owned(),
            Reply::Respond(ResponseSnapshot::new(status, Bytes::from_static(body.as_bytes()))),
        );
        self
    }

    /// Answers `path` with `200 OK` and `body`.
    pub fn ok(&self, path: &str, body: &'static str) -> &Self {
        self.respond(path, StatusCode::OK, body)
    }

    /// Fails requests to `path` with a transport error.
    pub fn fail(&self, path: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(path.to_owned(), Reply::Fail);
        self
    }

    /// Fails every request from now on.
    pub fn go_offline(&self) {
        self.state.lock().unwrap().offline = true;
    }

    /// Paths requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of requests to `path`.
    pub fn call_count(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.as_str() == path)
            .count()
    }

    /// Serves every app shell resource of the default configuration.
    pub fn with_app_shell(self) -> Self {
        for url in config().shell_urls() {
            self.ok(url, "shell");
        }
        self.ok("/offline.html", "<h1>offline</h1>");
        self
    }
}

impl Upstream<FetchRequest> for MockUpstream {
    type Response = NetworkResult;
    type Future = Ready<NetworkResult>;

    fn call(&mut self, request: FetchRequest) -> Self::Future {
        let mut state = self.state.lock().unwrap();
        let path = request.path().to_owned();
        state.calls.push(path.clone());

        if state.offline {
            return ready(Err(NetworkError::transport("offline")));
        }
        let result = match state.replies.get(&path) {
            Some(Reply::Respond(response)) => Ok(response.clone()),
            Some(Reply::Fail) => Err(NetworkError::transport("connection reset")),
            None => Ok(ResponseSnapshot::new(StatusCode::NOT_FOUND, Bytes::new())),
        };
        ready(result)
    }
}

fn injected(what: &str) -> StorageError {
    StorageError::ConnectionError(Box::new(std::io::Error::other(format!("{what} failed"))))
}

#[derive(Default)]
struct Faults {
    open: AtomicBool,
    keys: AtomicBool,
    writes: AtomicBool,
    deletes: Mutex<HashSet<String>>,
}

/// Memory storage with switchable faults.
#[derive(Clone, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    faults: Arc<Faults>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory(&self) -> &MemoryStorage {
        &self.inner
    }

    pub fn fail_open(&self) {
        self.faults.open.store(true, Ordering::SeqCst);
    }

    pub fn fail_keys(&self) {
        self.faults.keys.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.faults.writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, name: &str) {
        self.faults.deletes.lock().unwrap().insert(name.to_owned());
    }
}

struct FlakyPartition {
    inner: PartitionHandle,
    faults: Arc<Faults>,
}

#[async_trait]
impl Partition for FlakyPartition {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(&self, key: &RequestKey) -> StorageResult<Option<ResponseSnapshot>> {
        self.inner.lookup(key).await
    }

    async fn put(&self, key: RequestKey, response: ResponseSnapshot) -> StorageResult<()> {
        if self.faults.writes.load(Ordering::SeqCst) {
            return Err(injected("put"));
        }
        self.inner.put(key, response).await
    }

    async fn put_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>) -> StorageResult<()> {
        if self.faults.writes.load(Ordering::SeqCst) {
            return Err(injected("put_all"));
        }
        self.inner.put_all(entries).await
    }

    async fn delete(&self, key: &RequestKey) -> StorageResult<DeleteStatus> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> StorageResult<Vec<RequestKey>> {
        self.inner.keys().await
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> StorageResult<PartitionHandle> {
        if self.faults.open.load(Ordering::SeqCst) {
            return Err(injected("open"));
        }
        let partition: PartitionHandle = Arc::new(FlakyPartition {
            inner: self.inner.open(name).await?,
            faults: self.faults.clone(),
        });
        Ok(partition)
    }

    async fn has(&self, name: &str) -> StorageResult<bool> {
        self.inner.has(name).await
    }

    async fn keys(&self) -> StorageResult<Vec<SmolStr>> {
        if self.faults.keys.load(Ordering::SeqCst) {
            return Err(injected("keys"));
        }
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> StorageResult<DeleteStatus> {
        if self.faults.deletes.lock().unwrap().contains(name) {
            return Err(injected("delete"));
        }
        self.inner.delete(name).await
    }
}
