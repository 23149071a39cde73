//! Web origins and the same-origin check.
//!
//! An origin is the `(scheme, host, port)` triple of an absolute URL. Ports are
//! normalized to their effective value, so `https://example.org` and
//! `https://example.org:443` are the same origin.
//!
//! ```
//! use shellcache_core::Origin;
//! use http::Uri;
//!
//! let origin = Origin::parse("https://leapmultix.org").unwrap();
//!
//! assert!(origin.is_same_origin(&Uri::from_static("/index.html")));
//! assert!(origin.is_same_origin(&Uri::from_static("https://leapmultix.org:443/a.png")));
//! assert!(!origin.is_same_origin(&Uri::from_static("https://cdn.example.com/a.png")));
//! ```

use std::fmt;
use std::str::FromStr;

use http::Uri;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Error returned when a string is not a valid absolute origin.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid origin `{input}`: {reason}")]
pub struct InvalidOrigin {
    input: String,
    reason: &'static str,
}

impl InvalidOrigin {
    fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }
}

/// The `(scheme, host, port)` triple identifying a web origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin {
    scheme: SmolStr,
    host: SmolStr,
    port: Option<u16>,
}

impl Origin {
    /// Parses an origin from an absolute URL such as `https://example.org`.
    ///
    /// Any path or query is ignored.
    pub fn parse(input: &str) -> Result<Self, InvalidOrigin> {
        let uri: Uri = input
            .parse()
            .map_err(|_| InvalidOrigin::new(input, "not a valid URI"))?;
        Self::of(&uri).ok_or_else(|| InvalidOrigin::new(input, "scheme and host are required"))
    }

    /// Returns the origin of an absolute URI, or `None` for a relative one.
    pub fn of(uri: &Uri) -> Option<Self> {
        let scheme = uri.scheme_str()?.to_ascii_lowercase();
        let host = uri.host()?.to_ascii_lowercase();
        let port = uri.port_u16().or_else(|| default_port(&scheme));
        Some(Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        })
    }

    /// URL scheme, lowercased.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name, lowercased.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Effective port.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Checks whether `uri` belongs to this origin.
    ///
    /// Relative URIs resolve against this origin and are always same-origin.
    pub fn is_same_origin(&self, uri: &Uri) -> bool {
        match Self::of(uri) {
            Some(other) => &other == self,
            None => uri.scheme().is_none() && uri.authority().is_none(),
        }
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        match (self.port, default_port(&self.scheme)) {
            (Some(port), Some(default)) if port == default => Ok(()),
            (Some(port), _) => write!(f, ":{port}"),
            (None, _) => Ok(()),
        }
    }
}

impl FromStr for Origin {
    type Err = InvalidOrigin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Origin {
    type Error = InvalidOrigin;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_is_normalized() {
        let a = Origin::parse("https://example.org").unwrap();
        let b = Origin::parse("https://EXAMPLE.org:443/some/path").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "https://example.org");
    }

    #[test]
    fn explicit_port_differs() {
        let origin = Origin::parse("http://localhost:8000").unwrap();
        assert_eq!(origin.port(), Some(8000));
        assert_eq!(origin.to_string(), "http://localhost:8000");
        assert!(!origin.is_same_origin(&Uri::from_static("http://localhost/x")));
        assert!(origin.is_same_origin(&Uri::from_static("http://localhost:8000/x")));
    }

    #[test]
    fn scheme_mismatch_is_cross_origin() {
        let origin = Origin::parse("https://example.org").unwrap();
        assert!(!origin.is_same_origin(&Uri::from_static("http://example.org/")));
    }

    #[test]
    fn relative_path_is_rejected_as_origin() {
        assert!(Origin::parse("/index.html").is_err());
    }

    #[test]
    fn deserializes_from_string() {
        let origin: Origin = serde_json::from_str("\"http://localhost:8000\"").unwrap();
        assert_eq!(origin.host(), "localhost");
    }
}
