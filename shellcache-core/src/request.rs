//! Outgoing request description used for routing.
//!
//! A [`FetchRequest`] carries the parts of an HTTP request the dispatcher
//! needs to classify it: method, URI, headers, the request mode and the
//! destination. Mode and destination are read from the `Sec-Fetch-Mode` and
//! `Sec-Fetch-Dest` headers browsers attach to every request; a
//! [`RequestMode`] or [`Destination`] placed in the request extensions takes
//! precedence over the headers.

use std::fmt;
use std::str::FromStr;

use http::header::{HeaderMap, HeaderName};
use http::request::Parts;
use http::{Extensions, Method, Request, Uri, Version};
use serde::{Deserialize, Serialize};

/// Header carrying the request mode.
pub const SEC_FETCH_MODE: HeaderName = HeaderName::from_static("sec-fetch-mode");
/// Header carrying the request destination.
pub const SEC_FETCH_DEST: HeaderName = HeaderName::from_static("sec-fetch-dest");

/// Mode of a request, as in the Fetch standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level or frame navigation.
    Navigate,
    /// Same-origin only request.
    SameOrigin,
    /// Opaque cross-origin request.
    NoCors,
    /// CORS request.
    #[default]
    Cors,
    /// WebSocket handshake.
    Websocket,
}

impl RequestMode {
    /// Returns the mode as it appears in `Sec-Fetch-Mode`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Navigate => "navigate",
            RequestMode::SameOrigin => "same-origin",
            RequestMode::NoCors => "no-cors",
            RequestMode::Cors => "cors",
            RequestMode::Websocket => "websocket",
        }
    }
}

impl FromStr for RequestMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" => Ok(RequestMode::NoCors),
            "cors" => Ok(RequestMode::Cors),
            "websocket" => Ok(RequestMode::Websocket),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination of a request, as in the Fetch standard.
///
/// Unknown values map to [`Destination::Empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[allow(missing_docs)]
    Audio,
    #[allow(missing_docs)]
    Document,
    #[allow(missing_docs)]
    Embed,
    #[allow(missing_docs)]
    Font,
    #[allow(missing_docs)]
    Frame,
    #[allow(missing_docs)]
    Iframe,
    #[allow(missing_docs)]
    Image,
    #[allow(missing_docs)]
    Manifest,
    #[allow(missing_docs)]
    Object,
    #[allow(missing_docs)]
    Script,
    #[allow(missing_docs)]
    ServiceWorker,
    #[allow(missing_docs)]
    SharedWorker,
    #[allow(missing_docs)]
    Style,
    #[allow(missing_docs)]
    Track,
    #[allow(missing_docs)]
    Video,
    #[allow(missing_docs)]
    Worker,
    /// `fetch()`/XHR calls and anything unrecognized.
    #[default]
    Empty,
}

impl Destination {
    /// Returns the destination as it appears in `Sec-Fetch-Dest`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Destination::Audio => "audio",
            Destination::Document => "document",
            Destination::Embed => "embed",
            Destination::Font => "font",
            Destination::Frame => "frame",
            Destination::Iframe => "iframe",
            Destination::Image => "image",
            Destination::Manifest => "manifest",
            Destination::Object => "object",
            Destination::Script => "script",
            Destination::ServiceWorker => "serviceworker",
            Destination::SharedWorker => "sharedworker",
            Destination::Style => "style",
            Destination::Track => "track",
            Destination::Video => "video",
            Destination::Worker => "worker",
            Destination::Empty => "empty",
        }
    }

    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Destination::Audio,
            "document" => Destination::Document,
            "embed" => Destination::Embed,
            "font" => Destination::Font,
            "frame" => Destination::Frame,
            "iframe" => Destination::Iframe,
            "image" => Destination::Image,
            "manifest" => Destination::Manifest,
            "object" => Destination::Object,
            "script" => Destination::Script,
            "serviceworker" => Destination::ServiceWorker,
            "sharedworker" => Destination::SharedWorker,
            "style" => Destination::Style,
            "track" => Destination::Track,
            "video" => Destination::Video,
            "worker" => Destination::Worker,
            _ => Destination::Empty,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn classify(headers: &HeaderMap, extensions: &Extensions) -> (RequestMode, Destination) {
    let mode = extensions
        .get::<RequestMode>()
        .copied()
        .or_else(|| {
            headers
                .get(&SEC_FETCH_MODE)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
        })
        .unwrap_or_default();
    let destination = extensions
        .get::<Destination>()
        .copied()
        .or_else(|| {
            headers
                .get(&SEC_FETCH_DEST)
                .and_then(|value| value.to_str().ok())
                .map(Destination::parse)
        })
        .unwrap_or_default();
    (mode, destination)
}

/// An outgoing request as seen by the dispatcher.
///
/// Cloning is cheap enough to hand a copy to a background revalidation task.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    mode: RequestMode,
    destination: Destination,
}

impl FetchRequest {
    /// Creates a request with the given method and URI, default mode and empty destination.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            mode: RequestMode::default(),
            destination: Destination::default(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(uri: Uri) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Shorthand for a navigation (`GET`, mode `navigate`, destination `document`).
    pub fn navigate(uri: Uri) -> Self {
        Self::get(uri)
            .with_mode(RequestMode::Navigate)
            .with_destination(Destination::Document)
    }

    /// Builds a request description from HTTP request parts.
    pub fn from_parts(parts: &Parts) -> Self {
        let (mode, destination) = classify(&parts.headers, &parts.extensions);
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
            mode,
            destination,
        }
    }

    /// Builds a request description from an HTTP request, ignoring its body.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let (mode, destination) = classify(request.headers(), request.extensions());
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
            headers: request.headers().clone(),
            mode,
            destination,
        }
    }

    /// Overrides the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the destination.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI, possibly relative.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request mode.
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Request destination.
    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Whether this is a navigation request.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Converts into an `http::Request` with the given body.
    ///
    /// Mode and destination travel as request extensions.
    pub fn into_request<B>(self, body: B) -> Request<B> {
        let mut request = Request::new(body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.version_mut() = self.version;
        *request.headers_mut() = self.headers;
        request.extensions_mut().insert(self.mode);
        request.extensions_mut().insert(self.destination);
        request
    }
}
