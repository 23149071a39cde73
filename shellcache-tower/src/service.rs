use std::fmt;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Method, Request, Response};
use http_body::Body;
use shellcache::backend::CacheStorage;
use shellcache::offload::OffloadManager;
use shellcache::{CacheStatus, FetchDecision, FetchOutcome, FetchRequest, Offload, Worker};
use shellcache_core::BoxError;
use tower::{Service, ServiceExt};
use tracing::debug;

use crate::body::ShellBody;
use crate::future::ServiceWorkerFuture;
use crate::upstream::TowerUpstream;

/// Tower service that routes requests through a [`Worker`].
///
/// Until the worker controls its clients every request goes straight to the
/// inner service. Afterwards each request is resolved by the worker's routing
/// table: pass-through routes reach the inner service with their original
/// body, every other route is answered by the worker, using the inner
/// service as its network.
pub struct ServiceWorkerService<S, St, O = OffloadManager> {
    inner: S,
    worker: Worker<St, O>,
    status_header: HeaderName,
}

impl<S, St, O> ServiceWorkerService<S, St, O> {
    /// Wraps `inner` with `worker`, tagging answered responses with `status_header`.
    pub fn new(inner: S, worker: Worker<St, O>, status_header: HeaderName) -> Self {
        Self {
            inner,
            worker,
            status_header,
        }
    }

    /// The worker this service dispatches to.
    pub fn worker(&self) -> &Worker<St, O> {
        &self.worker
    }

    /// Returns a reference to the inner service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: Clone, St, O> Clone for ServiceWorkerService<S, St, O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            worker: self.worker.clone(),
            status_header: self.status_header.clone(),
        }
    }
}

impl<S: fmt::Debug, St, O> fmt::Debug for ServiceWorkerService<S, St, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceWorkerService")
            .field("inner", &self.inner)
            .field("worker", &self.worker)
            .field("status_header", &self.status_header)
            .finish()
    }
}

impl<S, St, O, ReqBody, ResBody> Service<Request<ReqBody>> for ServiceWorkerService<S, St, O>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send + 'static,
    St: CacheStorage + 'static,
    O: Offload + 'static,
    ReqBody: Default + Send + 'static,
    ResBody: Body<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<ShellBody<ResBody>>;
    type Error = S::Error;
    type Future = ServiceWorkerFuture<S::Future, ResBody, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if !self.worker.is_controlling() {
            return ServiceWorkerFuture::passthrough(self.inner.call(req));
        }

        // Keep the service that was driven to readiness for this request.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let worker = self.worker.clone();
        let status_header = self.status_header.clone();

        ServiceWorkerFuture::dispatched(Box::pin(async move {
            let fetch = FetchRequest::from_request(&req);
            let head = fetch.method() == Method::HEAD;
            let upstream = TowerUpstream::<S, ReqBody, ResBody>::new(inner.clone());

            match worker.on_fetch(fetch, upstream).await {
                FetchDecision::PassThrough(_) => {
                    let response = inner.oneshot(req).await?;
                    Ok(response.map(ShellBody::Passthrough))
                }
                FetchDecision::Respond(outcome) => Ok(respond(outcome, &status_header, head)),
            }
        }))
    }
}

fn respond<B>(
    outcome: FetchOutcome,
    status_header: &HeaderName,
    head: bool,
) -> Response<ShellBody<B>> {
    debug!(
        status = outcome.status.as_str(),
        source = outcome.source.as_str(),
        strategy = %outcome.strategy,
        "answered by worker"
    );
    let status = match outcome.status {
        CacheStatus::Hit => HeaderValue::from_static("HIT"),
        CacheStatus::Miss => HeaderValue::from_static("MISS"),
        CacheStatus::Stale => HeaderValue::from_static("STALE"),
    };
    let mut response = outcome.response.into_response();
    response.headers_mut().insert(status_header.clone(), status);
    response.map(|body| {
        if head {
            ShellBody::empty()
        } else {
            ShellBody::complete(body)
        }
    })
}
