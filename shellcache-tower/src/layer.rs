use std::fmt;

use http::header::HeaderName;
use shellcache::Worker;
use shellcache::offload::OffloadManager;
use tower::Layer;

use crate::service::ServiceWorkerService;

/// Default header carrying `HIT`, `MISS` or `STALE` on answered responses.
pub const DEFAULT_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// Tower [`Layer`] wrapping services with a [`Worker`].
pub struct ServiceWorkerLayer<St, O = OffloadManager> {
    worker: Worker<St, O>,
    status_header: HeaderName,
}

impl<St, O> ServiceWorkerLayer<St, O> {
    /// Creates a layer dispatching to `worker`.
    pub fn new(worker: Worker<St, O>) -> Self {
        Self {
            worker,
            status_header: DEFAULT_STATUS_HEADER,
        }
    }

    /// Sets the header that reports the cache status.
    pub fn cache_status_header(self, name: HeaderName) -> Self {
        Self {
            status_header: name,
            ..self
        }
    }

    /// The worker services created by this layer dispatch to.
    pub fn worker(&self) -> &Worker<St, O> {
        &self.worker
    }
}

impl<St, O> Clone for ServiceWorkerLayer<St, O> {
    fn clone(&self) -> Self {
        Self {
            worker: self.worker.clone(),
            status_header: self.status_header.clone(),
        }
    }
}

impl<St, O> fmt::Debug for ServiceWorkerLayer<St, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceWorkerLayer")
            .field("worker", &self.worker)
            .field("status_header", &self.status_header)
            .finish()
    }
}

impl<S, St, O> Layer<S> for ServiceWorkerLayer<St, O> {
    type Service = ServiceWorkerService<S, St, O>;

    fn layer(&self, inner: S) -> Self::Service {
        ServiceWorkerService::new(inner, self.worker.clone(), self.status_header.clone())
    }
}
