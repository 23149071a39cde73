//! Upstream adapter for bridging Tower services to the worker.
//!
//! [`TowerUpstream`] implements the worker's [`Upstream`] trait on top of a
//! Tower service, so strategies can reach the network through the wrapped
//! service. Responses are buffered into a [`ResponseSnapshot`] because the
//! worker may store them and return them at the same time.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::ready;
use http::response::Parts;
use http::{Request, Response};
use http_body::Body;
use http_body_util::BodyExt;
use http_body_util::combinators::Collect;
use pin_project::pin_project;
use shellcache_core::{BoxError, FetchRequest, NetworkError, NetworkResult, ResponseSnapshot, Upstream};
use tower::Service;
use tower::util::Oneshot;

/// Future returned by [`TowerUpstream::call`].
///
/// Drives the service call, then reads the response body to completion.
#[pin_project(project = TowerUpstreamFutureProj)]
pub enum TowerUpstreamFuture<S, ReqBody, ResBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body,
{
    /// Waiting for the service to respond.
    Calling(#[pin] Oneshot<S, Request<ReqBody>>),
    /// Reading the response body.
    Collecting {
        /// Response head, taken when the body completes.
        parts: Option<Parts>,
        /// Body being collected.
        #[pin]
        body: Collect<ResBody>,
    },
}

impl<S, ReqBody, ResBody> Future for TowerUpstreamFuture<S, ReqBody, ResBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
    ResBody: Body,
    ResBody::Error: Into<BoxError>,
{
    type Output = NetworkResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            match self.as_mut().project() {
                TowerUpstreamFutureProj::Calling(call) => {
                    let response = ready!(call.poll(cx)).map_err(NetworkError::transport)?;
                    let (parts, body) = response.into_parts();
                    self.set(TowerUpstreamFuture::Collecting {
                        parts: Some(parts),
                        body: body.collect(),
                    });
                }
                TowerUpstreamFutureProj::Collecting { parts, body } => {
                    let collected = ready!(body.poll(cx))
                        .map_err(|error| NetworkError::Body(error.into()))?;
                    let Some(parts) = parts.take() else {
                        return Poll::Ready(Err(NetworkError::Aborted));
                    };
                    let response = Response::from_parts(parts, collected.to_bytes());
                    return Poll::Ready(Ok(ResponseSnapshot::from_response(response)));
                }
            }
        }
    }
}

/// Adapter that implements the worker's [`Upstream`] trait for Tower services.
///
/// Every call clones the service and drives it with
/// [`Oneshot`](tower::util::Oneshot), so the adapter can be cloned freely
/// into background revalidation tasks. Requests are sent with a default
/// (empty) body; the worker only forwards `GET` and `HEAD` requests.
///
/// # Type Parameters
///
/// * `S` - The Tower service being adapted
/// * `ReqBody` - Request body type
/// * `ResBody` - Response body type
pub struct TowerUpstream<S, ReqBody, ResBody> {
    service: S,
    _phantom: PhantomData<fn(ReqBody) -> ResBody>,
}

impl<S, ReqBody, ResBody> TowerUpstream<S, ReqBody, ResBody> {
    /// Creates a new upstream adapter wrapping the given service.
    pub fn new(service: S) -> Self {
        Self {
            service,
            _phantom: PhantomData,
        }
    }
}

impl<S: Clone, ReqBody, ResBody> Clone for TowerUpstream<S, ReqBody, ResBody> {
    fn clone(&self) -> Self {
        Self::new(self.service.clone())
    }
}

impl<S: fmt::Debug, ReqBody, ResBody> fmt::Debug for TowerUpstream<S, ReqBody, ResBody> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TowerUpstream")
            .field("service", &self.service)
            .finish()
    }
}

impl<S, ReqBody, ResBody> Upstream<FetchRequest> for TowerUpstream<S, ReqBody, ResBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    ReqBody: Default + Send + 'static,
    ResBody: Body<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = NetworkResult;
    type Future = TowerUpstreamFuture<S, ReqBody, ResBody>;

    fn call(&mut self, req: FetchRequest) -> Self::Future {
        let request = req.into_request(ReqBody::default());
        TowerUpstreamFuture::Calling(Oneshot::new(self.service.clone(), request))
    }
}
