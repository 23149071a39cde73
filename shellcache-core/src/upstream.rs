use std::future::Future;

use thiserror::Error;

use crate::response::ResponseSnapshot;

/// Boxed error type for transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Network failure while fetching a request.
///
/// Only transport failures are errors; a 4xx or 5xx response is a successful
/// fetch of an unsuccessful response.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request could not be sent or no response arrived (offline, DNS, reset).
    #[error("network request failed: {0}")]
    Transport(#[source] BoxError),
    /// The response body could not be read to completion.
    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),
    /// The host aborted the request.
    #[error("request aborted")]
    Aborted,
}

impl NetworkError {
    /// Wraps any error as a transport failure.
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        NetworkError::Transport(error.into())
    }
}

/// Result of a network fetch.
pub type NetworkResult = Result<ResponseSnapshot, NetworkError>;

/// Trait for calling upstream services with fetch requests.
/// This trait is host-agnostic and can be implemented for any async transport.
///
/// Strategies clone the upstream to revalidate in the background, so
/// implementations should be cheap to clone.
///
/// # Examples
///
/// ```rust,ignore
/// use shellcache_core::{FetchRequest, NetworkError, NetworkResult, Upstream};
/// use std::future::Ready;
///
/// #[derive(Clone)]
/// struct Offline;
///
/// impl Upstream<FetchRequest> for Offline {
///     type Response = NetworkResult;
///     type Future = Ready<Self::Response>;
///
///     fn call(&mut self, _req: FetchRequest) -> Self::Future {
///         std::future::ready(Err(NetworkError::Aborted))
///     }
/// }
/// ```
pub trait Upstream<Req> {
    /// The response type returned by the upstream service
    type Response;

    /// The future that resolves to the response
    type Future: Future<Output = Self::Response> + Send;

    /// Call the upstream service with the given request
    fn call(&mut self, req: Req) -> Self::Future;
}
