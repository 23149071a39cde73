use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Future;
use futures::future::BoxFuture;
use futures::ready;
use http::Response;
use pin_project::pin_project;

use crate::body::ShellBody;

/// Future returned by [`ServiceWorkerService`](crate::ServiceWorkerService).
///
/// Requests the worker never looks at keep the inner service's future and
/// only rewrap the body. Requests handed to the worker run the whole
/// dispatch in a boxed future.
#[pin_project(project = ServiceWorkerFutureProj)]
pub enum ServiceWorkerFuture<F, ResBody, E> {
    /// Forwarded straight to the inner service.
    Passthrough {
        /// The inner service's future.
        #[pin]
        inner: F,
    },
    /// Dispatched through the worker.
    Dispatched {
        /// The worker's dispatch.
        inner: BoxFuture<'static, Result<Response<ShellBody<ResBody>>, E>>,
    },
}

impl<F, ResBody, E> ServiceWorkerFuture<F, ResBody, E> {
    pub(crate) fn passthrough(inner: F) -> Self {
        ServiceWorkerFuture::Passthrough { inner }
    }

    pub(crate) fn dispatched(
        inner: BoxFuture<'static, Result<Response<ShellBody<ResBody>>, E>>,
    ) -> Self {
        ServiceWorkerFuture::Dispatched { inner }
    }
}

impl<F, ResBody, E> Future for ServiceWorkerFuture<F, ResBody, E>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = Result<Response<ShellBody<ResBody>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            ServiceWorkerFutureProj::Passthrough { inner } => {
                let response = ready!(inner.poll(cx))?;
                Poll::Ready(Ok(response.map(ShellBody::Passthrough)))
            }
            ServiceWorkerFutureProj::Dispatched { inner } => inner.as_mut().poll(cx),
        }
    }
}
