//! Request identity used to address stored responses.
//!
//! A [`RequestKey`] is the `(method, url)` pair a partition is keyed by. For
//! same-origin requests the URL is the path and query; the origin is implied
//! by the partition owner. Cross-origin URLs keep their full form, though the
//! dispatcher never stores them.
//!
//! ```
//! use shellcache_core::{Origin, RequestKey};
//! use http::Uri;
//!
//! let origin = Origin::parse("https://leapmultix.org").unwrap();
//! let absolute = RequestKey::for_uri(&Uri::from_static("https://leapmultix.org/a.png?v=8"), &origin);
//! let relative = RequestKey::for_uri(&Uri::from_static("/a.png?v=8"), &origin);
//!
//! assert_eq!(absolute, relative);
//! assert_eq!(relative.to_string(), "GET /a.png?v=8");
//! ```

use std::fmt;

use http::{Method, Uri};
use smol_str::SmolStr;
use thiserror::Error;

use crate::origin::Origin;

/// Errors building a [`RequestKey`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Only `GET` and `HEAD` requests can be looked up.
    #[error("method {0} cannot address a cached response")]
    UnsupportedMethod(Method),
}

/// Identity of a stored response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: Method,
    url: SmolStr,
}

impl RequestKey {
    /// Creates a key for a `GET` request to `url`.
    pub fn get(url: impl Into<SmolStr>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
        }
    }

    /// Creates a key for `method` and `url`.
    ///
    /// `HEAD` keys address the same entry as `GET`; any other method is rejected.
    pub fn new(method: &Method, url: impl Into<SmolStr>) -> Result<Self, KeyError> {
        if method == Method::GET || method == Method::HEAD {
            Ok(Self::get(url))
        } else {
            Err(KeyError::UnsupportedMethod(method.clone()))
        }
    }

    /// Creates a `GET` key for `uri`, relative to `origin` when same-origin.
    pub fn for_uri(uri: &Uri, origin: &Origin) -> Self {
        if origin.is_same_origin(uri) {
            let url = uri
                .path_and_query()
                .map(|path| path.as_str())
                .filter(|path| !path.is_empty())
                .unwrap_or("/");
            Self::get(url)
        } else {
            Self::get(uri.to_string())
        }
    }

    /// Request method of the key.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URL of the key.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Approximate heap footprint, used by storage accounting.
    pub fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.url.len()
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_addresses_get_entry() {
        let head = RequestKey::new(&Method::HEAD, "/index.html").unwrap();
        assert_eq!(head, RequestKey::get("/index.html"));
    }

    #[test]
    fn mutating_methods_are_rejected() {
        assert_eq!(
            RequestKey::new(&Method::POST, "/scores"),
            Err(KeyError::UnsupportedMethod(Method::POST))
        );
    }

    #[test]
    fn cross_origin_keeps_full_url() {
        let origin = Origin::parse("https://leapmultix.org").unwrap();
        let key = RequestKey::for_uri(&Uri::from_static("https://cdn.example.com/lib.js"), &origin);
        assert_eq!(key.url(), "https://cdn.example.com/lib.js");
    }

    #[test]
    fn root_path_is_slash() {
        let origin = Origin::parse("https://leapmultix.org").unwrap();
        let key = RequestKey::for_uri(&Uri::from_static("https://leapmultix.org"), &origin);
        assert_eq!(key.url(), "/");
    }
}
