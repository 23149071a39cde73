//! Stored response snapshots.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Response, StatusCode, Version};

/// Header marking a synthesized network-error response.
pub const NETWORK_ERROR_HEADER: HeaderName = HeaderName::from_static("x-shellcache-error");

/// A fully buffered response: status, version, headers and body at capture time.
///
/// The body is [`Bytes`], so cloning a snapshot to store a copy while also
/// returning it only bumps a reference count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    synthetic: bool,
}

impl ResponseSnapshot {
    /// Creates a snapshot with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: body.into(),
            synthetic: false,
        }
    }

    /// A `200 OK` snapshot.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// The response returned when neither network nor cache can answer.
    ///
    /// `504 Gateway Timeout`, empty body, tagged with [`NETWORK_ERROR_HEADER`].
    pub fn network_error() -> Self {
        let mut response = Self::new(StatusCode::GATEWAY_TIMEOUT, Bytes::new())
            .with_header(NETWORK_ERROR_HEADER, HeaderValue::from_static("network"));
        response.synthetic = true;
        response
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Captures a buffered `http::Response`.
    pub fn from_response(response: Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body,
            synthetic: false,
        }
    }

    /// Rebuilds an `http::Response`.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.version_mut() = self.version;
        *response.headers_mut() = self.headers;
        response
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// `true` for 2xx statuses, the only responses worth storing.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `true` for the synthesized [`network_error`](Self::network_error) response.
    ///
    /// Upstream responses never qualify, whatever headers they carry.
    pub fn is_network_error(&self) -> bool {
        self.synthetic
    }

    /// Approximate heap footprint, used by storage accounting.
    pub fn memory_size(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        std::mem::size_of::<Self>() + headers + self.body.len()
    }
}
