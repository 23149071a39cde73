//! Tokio-backed [`Offload`] implementation.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shellcache_core::{Offload, RequestKey};
use smol_str::SmolStr;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};
use crate::metrics;

/// Identity of a background task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OffloadKey {
    /// Refresh of one stored request. Only these are deduplicated.
    Request {
        /// Task label, e.g. `revalidate`.
        kind: SmolStr,
        /// The request being refreshed.
        key: RequestKey,
    },
    /// Any other task, numbered in spawn order.
    Generated {
        /// Task label.
        kind: SmolStr,
        /// Sequence number.
        id: u64,
    },
}

impl OffloadKey {
    /// Task label, also used for span fields and metric labels.
    pub fn kind(&self) -> &SmolStr {
        match self {
            Self::Request { kind, .. } | Self::Generated { kind, .. } => kind,
        }
    }
}

/// A tracked background task.
#[derive(Debug)]
pub struct OffloadHandle {
    id: u64,
    handle: JoinHandle<()>,
}

impl OffloadHandle {
    /// Whether the task has run to completion, timed out or been aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Aborts the task at its next await point.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[derive(Debug)]
struct Registry {
    config: OffloadConfig,
    tasks: DashMap<OffloadKey, OffloadHandle>,
    sequence: AtomicU64,
}

/// Runs background refreshes on the ambient tokio runtime.
///
/// Every task is tracked until it finishes, which is what makes
/// deduplication and [`wait_all`](Self::wait_all) possible. A finished task
/// removes its own entry. Clones share the registry.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    registry: Arc<Registry>,
}

impl OffloadManager {
    /// Creates a manager with `config`.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            registry: Arc::new(Registry {
                config,
                tasks: DashMap::new(),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a manager with [`OffloadConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    /// Spawns `task` under a fresh [`OffloadKey::Generated`] key.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> OffloadKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = OffloadKey::Generated {
            kind: kind.into(),
            id: self.registry.sequence.fetch_add(1, Ordering::Relaxed),
        };
        self.spawn_with_key(key.clone(), task);
        key
    }

    /// Spawns `task` under `key`.
    ///
    /// With deduplication on, a [`OffloadKey::Request`] task is dropped
    /// unstarted while another task with the same key is running. Returns
    /// whether the task was spawned.
    pub fn spawn_with_key<F>(&self, key: OffloadKey, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let dedup = self.registry.config.deduplicate && matches!(key, OffloadKey::Request { .. });
        let id = self.registry.sequence.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("offload_task", kind = %key.kind(), key = ?key);
        let future = run(task, key.clone(), id, Arc::clone(&self.registry));

        // The entry stays locked until the handle is stored, so the task
        // cannot deregister before it is registered.
        match self.registry.tasks.entry(key) {
            Entry::Occupied(entry) if dedup && !entry.get().is_finished() => {
                debug!(key = ?entry.key(), "refresh already running, skipped");
                metrics::record_offload_deduplicated(entry.key().kind());
                false
            }
            entry => {
                metrics::record_offload_spawned(entry.key().kind());
                let handle = tokio::spawn(future.instrument(span));
                entry.insert(OffloadHandle { id, handle });
                true
            }
        }
    }

    /// Number of tasks in the registry, finished or not.
    pub fn tracked_task_count(&self) -> usize {
        self.registry.tasks.len()
    }

    /// Number of tracked tasks still running.
    pub fn active_task_count(&self) -> usize {
        self.registry
            .tasks
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Forgets tasks that have finished.
    pub fn cleanup_finished(&self) {
        self.registry.tasks.retain(|_, task| !task.is_finished());
    }

    /// Aborts every tracked task and forgets it.
    pub fn cancel_all(&self) {
        self.registry.tasks.retain(|_, task| {
            task.abort();
            false
        });
    }

    /// Whether a task with `key` is still running.
    pub fn is_in_flight(&self, key: &OffloadKey) -> bool {
        self.registry
            .tasks
            .get(key)
            .is_some_and(|task| !task.is_finished())
    }

    /// Resolves once every tracked task has finished, including tasks spawned
    /// while waiting.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.registry.tasks.is_empty() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    /// [`wait_all`](Self::wait_all) bounded by `timeout`; `false` if it elapsed first.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }
}

async fn run<F>(task: F, key: OffloadKey, id: u64, registry: Arc<Registry>)
where
    F: Future<Output = ()>,
{
    let start = Instant::now();
    let timed_out = match registry.config.timeout_policy {
        TimeoutPolicy::None => {
            task.await;
            false
        }
        TimeoutPolicy::Cancel(limit) => {
            let expired = tokio::time::timeout(limit, task).await.is_err();
            if expired {
                warn!(?key, limit_ms = limit.as_millis(), "offload task cancelled");
            }
            expired
        }
        TimeoutPolicy::Warn(limit) => {
            task.await;
            let elapsed = start.elapsed();
            if elapsed > limit {
                warn!(
                    ?key,
                    elapsed_ms = elapsed.as_millis(),
                    limit_ms = limit.as_millis(),
                    "offload task overran its budget"
                );
            }
            false
        }
    };
    metrics::record_offload_finished(key.kind(), start.elapsed(), timed_out);
    registry.tasks.remove_if(&key, |_, task| task.id == id);
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }

    fn spawn_for_key<F>(&self, key: &RequestKey, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = OffloadKey::Request {
            kind: kind.into(),
            key: key.clone(),
        };
        self.spawn_with_key(key, future);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn wait_all_drains_spawned_tasks() {
        let manager = OffloadManager::with_defaults();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = counter.clone();
            manager.spawn("test", async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        manager.wait_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(manager.active_task_count(), 0);
    }

    #[tokio::test]
    async fn deduplicates_refreshes_of_the_same_request() {
        let manager = OffloadManager::with_defaults();
        let key = RequestKey::get("/assets/translations/fr.json");
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let first = manager.spawn_with_key(
            OffloadKey::Request {
                kind: "revalidate".into(),
                key: key.clone(),
            },
            async move {
                let _ = wait.await;
            },
        );
        let second = manager.spawn_with_key(
            OffloadKey::Request {
                kind: "revalidate".into(),
                key,
            },
            async {},
        );

        assert!(first);
        assert!(!second);
        let _ = release.send(());
        manager.wait_all().await;
    }

    #[tokio::test]
    async fn cancel_policy_drops_slow_tasks() {
        let manager = OffloadManager::new(
            OffloadConfig::builder()
                .timeout(Duration::from_millis(10))
                .build(),
        );
        let finished = Arc::new(AtomicUsize::new(0));
        let flag = finished.clone();
        manager.spawn("slow", async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });
        assert!(manager.wait_all_timeout(Duration::from_secs(1)).await);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn finished_tasks_leave_the_registry() {
        let manager = OffloadManager::with_defaults();
        for index in 0..200 {
            manager.spawn_for_key(
                &RequestKey::get(format!("/assets/translations/{index}.json")),
                "revalidate",
                async {},
            );
            manager.spawn("test", async {});
        }

        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while manager.tracked_task_count() > 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
        assert!(drained.is_ok());
        assert!(manager.registry.tasks.is_empty());
    }
}
