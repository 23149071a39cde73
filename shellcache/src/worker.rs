//! The worker: lifecycle events, fetch dispatch and messages.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, try_join_all};
use http::{Method, Uri};
use shellcache_backend::{CacheStorage, DeleteStatus};
use shellcache_core::{FetchRequest, NetworkResult, Offload, RequestKey, Upstream};
use smol_str::SmolStr;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, instrument, warn};

use crate::config::{PartitionNames, WorkerConfig};
use crate::error::{ConfigError, InstallFailure, WorkerError};
use crate::lifecycle::{ActivationReport, Lifecycle, WorkerState};
use crate::message::{WorkerMessage, WorkerReply};
use crate::metrics;
use crate::offload::{OffloadConfig, OffloadManager, TimeoutPolicy};
use crate::route::{RouteTable, Strategy};
use crate::strategy::{Dispatch, FetchDecision};

struct Inner<S, O> {
    config: WorkerConfig,
    names: PartitionNames,
    routes: RouteTable,
    shell: Vec<(String, Uri)>,
    offline_key: RequestKey,
    storage: S,
    offload: O,
    lifecycle: Lifecycle,
}

/// An offline-first cache dispatcher.
///
/// The worker owns the partition naming scheme and the routing table; the
/// storage and the background executor are injected, and the network is
/// passed to each call. Clones share state.
///
/// ```ignore
/// let worker = Worker::new(config, MemoryStorage::new())?;
/// worker.on_install(network.clone()).await?;
/// worker.on_activate().await?;
///
/// match worker.on_fetch(request, network).await {
///     FetchDecision::Respond(outcome) => reply(outcome.response),
///     FetchDecision::PassThrough(request) => forward(request),
/// }
/// ```
pub struct Worker<S, O = OffloadManager> {
    inner: Arc<Inner<S, O>>,
}

impl<S, O> Clone for Worker<S, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, O> fmt::Debug for Worker<S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("version", &self.inner.config.version)
            .field("state", &self.inner.lifecycle.state())
            .field("routes", &self.inner.routes.len())
            .finish()
    }
}

/// Marker for a builder field that has not been set yet.
#[derive(Debug, Clone, Copy)]
pub struct NotSet;

impl Worker<NotSet> {
    /// Starts building a worker.
    ///
    /// Background refreshes default to an [`OffloadManager`] bounded by
    /// [`WorkerConfig::revalidate_timeout`].
    pub fn builder(config: WorkerConfig) -> WorkerBuilder<NotSet, OffloadManager> {
        let timeout_policy = TimeoutPolicy::cancel_after(config.revalidate_timeout);
        let offload = OffloadManager::new(
            OffloadConfig::builder()
                .timeout_policy(timeout_policy)
                .build(),
        );
        WorkerBuilder {
            config,
            storage: NotSet,
            offload,
            routes: None,
        }
    }
}

impl<S> Worker<S>
where
    S: CacheStorage,
{
    /// Builds a worker with the default offload manager.
    pub fn new(config: WorkerConfig, storage: S) -> Result<Self, ConfigError> {
        Worker::<NotSet>::builder(config).storage(storage).build()
    }
}

/// Builder for [`Worker`].
pub struct WorkerBuilder<S, O> {
    config: WorkerConfig,
    storage: S,
    offload: O,
    routes: Option<RouteTable>,
}

impl<S, O> WorkerBuilder<S, O> {
    /// Sets the cache storage.
    pub fn storage<NS>(self, storage: NS) -> WorkerBuilder<NS, O> {
        WorkerBuilder {
            config: self.config,
            storage,
            offload: self.offload,
            routes: self.routes,
        }
    }

    /// Sets the background executor.
    pub fn offload<NO>(self, offload: NO) -> WorkerBuilder<S, NO> {
        WorkerBuilder {
            config: self.config,
            storage: self.storage,
            offload,
            routes: self.routes,
        }
    }

    /// Replaces the routing table derived from the configuration.
    pub fn routes(self, routes: RouteTable) -> Self {
        Self {
            routes: Some(routes),
            ..self
        }
    }
}

impl<S, O> WorkerBuilder<S, O>
where
    S: CacheStorage,
    O: Offload,
{
    /// Validates the configuration and builds the worker.
    pub fn build(self) -> Result<Worker<S, O>, ConfigError> {
        let config = self.config;
        config.validate()?;

        let routes = match self.routes {
            Some(routes) => routes,
            None => config.route_table()?,
        };

        let shell = config
            .shell_urls()
            .into_iter()
            .map(|url| {
                url.parse::<Uri>()
                    .map(|uri| (url.to_owned(), uri))
                    .map_err(|_| ConfigError::InvalidUrl(url.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let offline_uri: Uri = config
            .offline_url
            .parse()
            .map_err(|_| ConfigError::InvalidUrl(config.offline_url.clone()))?;
        let offline_key = RequestKey::for_uri(&offline_uri, &config.origin);

        Ok(Worker {
            inner: Arc::new(Inner {
                names: config.partition_names(),
                config,
                routes,
                shell,
                offline_key,
                storage: self.storage,
                offload: self.offload,
                lifecycle: Lifecycle::new(),
            }),
        })
    }
}

impl<S, O> Worker<S, O> {
    /// The configuration the worker was built from.
    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    /// Partition names for the configured version.
    pub fn partition_names(&self) -> &PartitionNames {
        &self.inner.names
    }

    /// The cache storage.
    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    /// The background executor.
    pub fn offload(&self) -> &O {
        &self.inner.offload
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.inner.lifecycle.state()
    }

    /// Watches lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.inner.lifecycle.subscribe()
    }

    /// Whether the worker asked to activate without waiting.
    pub fn skip_waiting_requested(&self) -> bool {
        self.inner.lifecycle.skip_waiting_requested()
    }

    /// Whether the worker controls clients, i.e. activation completed.
    pub fn is_controlling(&self) -> bool {
        self.inner.lifecycle.is_controlling()
    }
}

impl<S, O> Worker<S, O>
where
    S: CacheStorage,
    O: Offload,
{
    /// Stores the offline page and the app shell in the offline partition.
    ///
    /// Every resource is fetched before anything is written; one network
    /// failure or non-2xx status fails the install, leaves the partition
    /// empty and makes the worker redundant.
    #[instrument(skip_all, fields(version = %self.inner.config.version))]
    pub async fn on_install<U>(&self, upstream: U) -> Result<(), WorkerError>
    where
        U: Upstream<FetchRequest, Response = NetworkResult> + Clone,
    {
        let lifecycle = &self.inner.lifecycle;
        lifecycle.transition(WorkerState::Installing);

        match self.install(upstream).await {
            Ok(stored) => {
                info!(stored, partition = self.inner.names.offline(), "app shell stored");
                lifecycle.transition(WorkerState::Installed);
                lifecycle.request_skip_waiting();
                Ok(())
            }
            Err(error) => {
                warn!(%error, "install failed");
                lifecycle.transition(WorkerState::Redundant);
                Err(error)
            }
        }
    }

    async fn install<U>(&self, upstream: U) -> Result<usize, WorkerError>
    where
        U: Upstream<FetchRequest, Response = NetworkResult> + Clone,
    {
        let partition = self.inner.storage.open(self.inner.names.offline()).await?;
        let origin = &self.inner.config.origin;

        let fetches = self.inner.shell.iter().map(|(url, uri)| {
            let mut upstream = upstream.clone();
            async move {
                let response = upstream
                    .call(FetchRequest::get(uri.clone()))
                    .await
                    .map_err(|error| WorkerError::Install {
                        url: url.clone(),
                        reason: InstallFailure::Network(error),
                    })?;
                if !response.is_success() {
                    return Err(WorkerError::Install {
                        url: url.clone(),
                        reason: InstallFailure::Status(response.status()),
                    });
                }
                debug!(%url, "fetched app shell resource");
                Ok((RequestKey::for_uri(uri, origin), response))
            }
        });

        let entries = try_join_all(fetches).await?;
        let stored = entries.len();
        partition.put_all(entries).await?;
        Ok(stored)
    }

    /// Deletes partitions left by other versions, then claims clients.
    ///
    /// Deletions run concurrently and independently; failures are logged and
    /// listed in the report. Only a redundant worker refuses to activate.
    #[instrument(skip_all, fields(version = %self.inner.config.version))]
    pub async fn on_activate(&self) -> Result<ActivationReport, WorkerError> {
        let lifecycle = &self.inner.lifecycle;
        if lifecycle.state() == WorkerState::Redundant {
            return Err(WorkerError::Redundant);
        }
        lifecycle.transition(WorkerState::Activating);

        let stale = match self.inner.storage.keys().await {
            Ok(names) => names
                .into_iter()
                .filter(|name| self.inner.names.is_stale(name))
                .collect(),
            Err(error) => {
                warn!(%error, "failed to list partitions, skipping cleanup");
                Vec::new()
            }
        };

        let report = self.delete_partitions(stale).await;
        metrics::record_partitions_deleted(report.deleted.len());
        if !report.is_clean() {
            warn!(failed = ?report.failed, "some stale partitions could not be deleted");
        }

        lifecycle.claim();
        info!(deleted = ?report.deleted, "activated");
        Ok(report)
    }

    /// Deletes every partition owned by the application, current version included.
    ///
    /// Returns the names of the partitions deleted.
    pub async fn clear_all(&self) -> Result<Vec<SmolStr>, WorkerError> {
        let owned = self
            .inner
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| self.inner.names.is_owned(name))
            .collect();

        let report = self.delete_partitions(owned).await;
        metrics::record_partitions_deleted(report.deleted.len());
        info!(deleted = ?report.deleted, "cleared partitions");
        Ok(report.deleted)
    }

    async fn delete_partitions(&self, names: Vec<SmolStr>) -> ActivationReport {
        let storage = &self.inner.storage;
        let results = join_all(names.into_iter().map(|name| async move {
            let result = storage.delete(&name).await;
            (name, result)
        }))
        .await;

        let mut report = ActivationReport::default();
        for (name, result) in results {
            match result {
                Ok(DeleteStatus::Deleted(entries)) => {
                    debug!(partition = %name, entries, "partition deleted");
                    report.deleted.push(name);
                }
                Ok(DeleteStatus::Missing) => {
                    debug!(partition = %name, "partition already gone");
                }
                Err(error) => {
                    warn!(%error, partition = %name, "failed to delete partition");
                    report.failed.push(name);
                }
            }
        }
        report
    }

    /// Routes a request to its strategy.
    ///
    /// Never fails: network and storage errors resolve to cached copies, the
    /// offline page or the network-error response.
    #[instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
    pub async fn on_fetch<U>(&self, request: FetchRequest, upstream: U) -> FetchDecision
    where
        U: Upstream<FetchRequest, Response = NetworkResult> + Send + 'static,
    {
        let Some(route) = self.inner.routes.resolve(&request) else {
            debug!("no route matched");
            metrics::record_passthrough();
            return FetchDecision::PassThrough(request);
        };
        let strategy = route.strategy();
        debug!(route = route.name(), %strategy, "route matched");

        let start = Instant::now();
        let dispatch = self.dispatch(&request);
        let outcome = match strategy {
            Strategy::PassThrough => {
                metrics::record_passthrough();
                return FetchDecision::PassThrough(request);
            }
            Strategy::NavigationFallback => dispatch.navigation_fallback(request, upstream).await,
            Strategy::CacheFirst => dispatch.cache_first(request, upstream).await,
            Strategy::StaleWhileRevalidate => {
                dispatch.stale_while_revalidate(request, upstream).await
            }
            Strategy::NetworkFirst => dispatch.network_first(request, upstream).await,
        };

        debug!(
            status = outcome.status.as_str(),
            source = outcome.source.as_str(),
            "responded"
        );
        metrics::record_outcome(&outcome, start.elapsed());
        FetchDecision::Respond(outcome)
    }

    fn dispatch(&self, request: &FetchRequest) -> Dispatch<'_, S, O> {
        let origin = &self.inner.config.origin;
        let method = request.method();
        let cacheable = origin.is_same_origin(request.uri())
            && (method == Method::GET || method == Method::HEAD);
        let key = cacheable.then(|| RequestKey::for_uri(request.uri(), origin));

        Dispatch {
            storage: &self.inner.storage,
            offload: &self.inner.offload,
            names: &self.inner.names,
            offline_key: &self.inner.offline_key,
            writable: key.is_some() && method == Method::GET,
            key,
        }
    }

    /// Handles a message from a page.
    pub async fn on_message(&self, message: WorkerMessage) -> Option<WorkerReply> {
        debug!(?message, "message received");
        match message {
            WorkerMessage::SkipWaiting => {
                self.inner.lifecycle.request_skip_waiting();
                None
            }
            WorkerMessage::CheckVersion => Some(WorkerReply::Version {
                version: self.inner.config.version.clone(),
            }),
            WorkerMessage::ClearCaches => Some(match self.clear_all().await {
                Ok(deleted) => WorkerReply::CachesCleared { deleted },
                Err(error) => {
                    warn!(%error, "failed to clear partitions");
                    WorkerReply::Error {
                        message: error.to_string(),
                    }
                }
            }),
        }
    }

    /// Handles a message and delivers the reply, if any, on `reply_to`.
    ///
    /// Messages without a reply drop the sender.
    pub async fn on_message_with_reply(
        &self,
        message: WorkerMessage,
        reply_to: oneshot::Sender<WorkerReply>,
    ) {
        if let Some(reply) = self.on_message(message).await
            && reply_to.send(reply).is_err()
        {
            debug!("reply receiver dropped");
        }
    }
}
