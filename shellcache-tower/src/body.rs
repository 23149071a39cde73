//! Response body returned by [`ServiceWorkerService`](crate::ServiceWorkerService).

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use pin_project::pin_project;

/// Either the inner service's body, streamed untouched, or a buffered body
/// produced by the worker.
#[pin_project(project = ShellBodyProj)]
#[derive(Debug)]
pub enum ShellBody<B> {
    /// Body of a request the worker did not intercept.
    Passthrough(#[pin] B),
    /// Body of a response the worker answered. `None` once yielded.
    Complete(Option<Bytes>),
}

impl<B> ShellBody<B> {
    /// A buffered body.
    pub fn complete(bytes: Bytes) -> Self {
        ShellBody::Complete(Some(bytes))
    }

    /// An empty buffered body.
    pub fn empty() -> Self {
        ShellBody::Complete(None)
    }
}

impl<B> Body for ShellBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            ShellBodyProj::Passthrough(body) => body.poll_frame(cx),
            ShellBodyProj::Complete(bytes) => {
                Poll::Ready(bytes.take().filter(|b| !b.is_empty()).map(|b| Ok(Frame::data(b))))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            ShellBody::Passthrough(body) => body.is_end_stream(),
            ShellBody::Complete(bytes) => bytes.as_ref().is_none_or(Bytes::is_empty),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            ShellBody::Passthrough(body) => body.size_hint(),
            ShellBody::Complete(bytes) => {
                SizeHint::with_exact(bytes.as_ref().map_or(0, |b| b.len() as u64))
            }
        }
    }
}
