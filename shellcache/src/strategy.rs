//! Fetch strategies.
//!
//! Every strategy resolves to a [`FetchOutcome`]: network failures and
//! storage failures are absorbed here and turned into cached copies, the
//! offline page or the network-error response.

use shellcache_backend::{CacheStorage, Partition, PartitionHandle};
use shellcache_core::{
    CacheStatus, FetchRequest, NetworkResult, Offload, RequestKey, ResponseSnapshot,
    ResponseSource, Upstream,
};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::config::PartitionNames;
use crate::metrics;
use crate::route::Strategy;

/// A response produced by the worker.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// The response handed back to the host.
    pub response: ResponseSnapshot,
    /// Whether it came from a partition.
    pub status: CacheStatus,
    /// Where it came from.
    pub source: ResponseSource,
    /// The strategy that produced it.
    pub strategy: Strategy,
}

impl FetchOutcome {
    fn network(response: ResponseSnapshot, strategy: Strategy) -> Self {
        Self {
            response,
            status: CacheStatus::Miss,
            source: ResponseSource::Network,
            strategy,
        }
    }

    fn cached(
        response: ResponseSnapshot,
        status: CacheStatus,
        partition: &str,
        strategy: Strategy,
    ) -> Self {
        Self {
            response,
            status,
            source: ResponseSource::Partition(SmolStr::new(partition)),
            strategy,
        }
    }

    fn network_error(strategy: Strategy) -> Self {
        Self {
            response: ResponseSnapshot::network_error(),
            status: CacheStatus::Miss,
            source: ResponseSource::Synthetic,
            strategy,
        }
    }
}

/// What the host should do with a request.
#[derive(Debug)]
pub enum FetchDecision {
    /// Not intercepted; handle the request natively.
    PassThrough(FetchRequest),
    /// Intercepted; answer with this outcome.
    Respond(FetchOutcome),
}

impl FetchDecision {
    /// The outcome, if the request was intercepted.
    pub fn outcome(&self) -> Option<&FetchOutcome> {
        match self {
            FetchDecision::PassThrough(_) => None,
            FetchDecision::Respond(outcome) => Some(outcome),
        }
    }

    /// Consumes the decision, returning the outcome if the request was intercepted.
    pub fn into_outcome(self) -> Option<FetchOutcome> {
        match self {
            FetchDecision::PassThrough(_) => None,
            FetchDecision::Respond(outcome) => Some(outcome),
        }
    }
}

/// Per-request view of the worker used by the strategies.
pub(crate) struct Dispatch<'a, S, O> {
    pub(crate) storage: &'a S,
    pub(crate) offload: &'a O,
    pub(crate) names: &'a PartitionNames,
    pub(crate) offline_key: &'a RequestKey,
    /// Partition key of the request; `None` when it must not touch the cache.
    pub(crate) key: Option<RequestKey>,
    /// Whether a network response may be stored.
    pub(crate) writable: bool,
}

impl<S, O> Dispatch<'_, S, O>
where
    S: CacheStorage,
    O: Offload,
{
    pub(crate) async fn navigation_fallback<U>(
        &self,
        request: FetchRequest,
        mut upstream: U,
    ) -> FetchOutcome
    where
        U: Upstream<FetchRequest, Response = NetworkResult>,
    {
        const STRATEGY: Strategy = Strategy::NavigationFallback;

        match upstream.call(request).await {
            Ok(response) => FetchOutcome::network(response, STRATEGY),
            Err(error) => {
                warn!(%error, "navigation failed, serving offline page");
                let offline = self.names.offline();
                match self.storage.lookup_in(offline, self.offline_key).await {
                    Ok(Some(page)) => FetchOutcome::cached(page, CacheStatus::Hit, offline, STRATEGY),
                    Ok(None) => {
                        warn!(partition = offline, "offline page missing");
                        FetchOutcome::network_error(STRATEGY)
                    }
                    Err(error) => {
                        warn!(%error, partition = offline, "offline page lookup failed");
                        FetchOutcome::network_error(STRATEGY)
                    }
                }
            }
        }
    }

    pub(crate) async fn cache_first<U>(&self, request: FetchRequest, mut upstream: U) -> FetchOutcome
    where
        U: Upstream<FetchRequest, Response = NetworkResult>,
    {
        const STRATEGY: Strategy = Strategy::CacheFirst;

        let partition = self.runtime().await;
        if let Some(cached) = self.lookup(partition.as_ref()).await {
            return FetchOutcome::cached(cached, CacheStatus::Hit, self.names.runtime(), STRATEGY);
        }

        match upstream.call(request).await {
            Ok(response) => {
                self.store(partition.as_ref(), &response).await;
                FetchOutcome::network(response, STRATEGY)
            }
            Err(error) => {
                warn!(%error, "network failed on cache miss");
                FetchOutcome::network_error(STRATEGY)
            }
        }
    }

    pub(crate) async fn stale_while_revalidate<U>(
        &self,
        request: FetchRequest,
        mut upstream: U,
    ) -> FetchOutcome
    where
        U: Upstream<FetchRequest, Response = NetworkResult> + Send + 'static,
    {
        const STRATEGY: Strategy = Strategy::StaleWhileRevalidate;

        let partition = self.runtime().await;
        if let Some(cached) = self.lookup(partition.as_ref()).await {
            if let (Some(partition), Some(key), true) = (partition, self.key.as_ref(), self.writable) {
                let refresh = revalidate(partition, key.clone(), request, upstream);
                self.offload.spawn_for_key(key, "revalidate", refresh);
            }
            return FetchOutcome::cached(cached, CacheStatus::Stale, self.names.runtime(), STRATEGY);
        }

        match upstream.call(request).await {
            Ok(response) => {
                self.store(partition.as_ref(), &response).await;
                FetchOutcome::network(response, STRATEGY)
            }
            Err(error) => {
                warn!(%error, "network failed and nothing cached");
                FetchOutcome::network_error(STRATEGY)
            }
        }
    }

    pub(crate) async fn network_first<U>(&self, request: FetchRequest, mut upstream: U) -> FetchOutcome
    where
        U: Upstream<FetchRequest, Response = NetworkResult>,
    {
        const STRATEGY: Strategy = Strategy::NetworkFirst;

        let partition = self.runtime().await;
        match upstream.call(request).await {
            Ok(response) => {
                self.store(partition.as_ref(), &response).await;
                FetchOutcome::network(response, STRATEGY)
            }
            Err(error) => match self.lookup(partition.as_ref()).await {
                Some(cached) => {
                    debug!(%error, "network failed, serving cached copy");
                    FetchOutcome::cached(cached, CacheStatus::Hit, self.names.runtime(), STRATEGY)
                }
                None => {
                    warn!(%error, "network failed and nothing cached");
                    FetchOutcome::network_error(STRATEGY)
                }
            },
        }
    }

    async fn runtime(&self) -> Option<PartitionHandle> {
        self.key.as_ref()?;
        let name = self.names.runtime();
        match self.storage.open(name).await {
            Ok(partition) => Some(partition),
            Err(error) => {
                warn!(%error, partition = name, "failed to open partition");
                None
            }
        }
    }

    async fn lookup(&self, partition: Option<&PartitionHandle>) -> Option<ResponseSnapshot> {
        let (partition, key) = (partition?, self.key.as_ref()?);
        match partition.lookup(key).await {
            Ok(found) => found,
            Err(error) => {
                warn!(%error, partition = partition.name(), %key, "cache lookup failed");
                None
            }
        }
    }

    async fn store(&self, partition: Option<&PartitionHandle>, response: &ResponseSnapshot) {
        if !self.writable || !response.is_success() {
            return;
        }
        if let (Some(partition), Some(key)) = (partition, self.key.as_ref()) {
            store(&**partition, key.clone(), response.clone()).await;
        }
    }
}

async fn store(partition: &dyn Partition, key: RequestKey, response: ResponseSnapshot) {
    let shown = key.to_string();
    if let Err(error) = partition.put(key, response).await {
        warn!(%error, partition = partition.name(), key = %shown, "cache write failed");
        metrics::record_write_error(partition.name());
    }
}

async fn revalidate<U>(
    partition: PartitionHandle,
    key: RequestKey,
    request: FetchRequest,
    mut upstream: U,
) where
    U: Upstream<FetchRequest, Response = NetworkResult>,
{
    match upstream.call(request).await {
        Ok(response) if response.is_success() => {
            debug!(%key, "revalidated");
            store(&*partition, key, response).await;
        }
        Ok(response) => {
            debug!(%key, status = %response.status(), "revalidation not stored");
        }
        Err(error) => {
            warn!(%error, %key, "revalidation failed");
        }
    }
}
