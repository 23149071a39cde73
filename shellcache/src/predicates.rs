//! Request predicates for the routing table.
//!
//! Each predicate inspects one facet of a [`FetchRequest`]. Combine them with
//! [`PredicateExt`](shellcache_core::PredicateExt):
//!
//! ```
//! use shellcache::predicates::{PathContains, PathSuffix};
//! use shellcache_core::{FetchRequest, Predicate, PredicateExt};
//! use http::Uri;
//!
//! let translations = PathContains::new("/assets/translations/").and(PathSuffix::new(".json"));
//!
//! assert!(translations.check(&FetchRequest::get(Uri::from_static("/assets/translations/fr.json"))));
//! assert!(!translations.check(&FetchRequest::get(Uri::from_static("/assets/fr.json"))));
//! ```

use regex::Regex;
use shellcache_core::{Destination, FetchRequest, Origin, Predicate, RequestMode};

/// Boxed request predicate, as stored in a routing table.
pub type BoxPredicate = Box<dyn Predicate<Subject = FetchRequest> + Send + Sync>;

/// Matches requests with the given HTTP method.
#[derive(Debug, Clone)]
pub struct Method {
    method: http::Method,
}

impl Method {
    /// Creates a predicate matching `method`.
    pub fn new(method: http::Method) -> Self {
        Self { method }
    }
}

impl Predicate for Method {
    type Subject = FetchRequest;

    fn check(&self, request: &FetchRequest) -> bool {
        request.method() == self.method
    }
}

/// Matches requests with the given mode.
#[derive(Debug, Clone, Copy)]
pub struct Mode {
    mode: RequestMode,
}

impl Mode {
    /// Creates a predicate matching `mode`.
    pub fn new(mode: RequestMode) -> Self {
        Self { mode }
    }

    /// Matches navigations.
    pub fn navigate() -> Self {
        Self::new(RequestMode::Navigate)
    }
}

impl Predicate for Mode {
    type Subject = FetchRequest;

    fn check(&self, request: &FetchRequest) -> bool {
        request.mode() == self.mode
    }
}

/// Matches requests whose destination is one of a set.
#[derive(Debug, Clone)]
pub struct DestinationIn {
    destinations: Vec<Destination>,
}

impl DestinationIn {
    /// Creates a predicate matching any of `destinations`.
    pub fn new(destinations: impl IntoIterator<Item = Destination>) -> Self {
        Self {
            destinations: destinations.into_iter().collect(),
        }
    }
}

impl Predicate for DestinationIn {
    type Subject = FetchRequest;

    fn check(&self, request: &FetchRequest) -> bool {
        self.destinations.contains(&request.destination())
    }
}

/// Matches requests that leave the given origin.
#[derive(Debug, Clone)]
pub struct CrossOrigin {
    origin: Origin,
}

impl CrossOrigin {
    /// Creates a predicate matching requests not addressed to `origin`.
    pub fn new(origin: Origin) -> Self {
        Self { origin }
    }
}

impl Predicate for CrossOrigin {
    type Subject = FetchRequest;

    fn check(&self, request: &FetchRequest) -> bool {
        !self.origin.is_same_origin(request.uri())
    }
}

/// Matches request paths containing a substring.
#[derive(Debug, Clone)]
pub struct PathContains {
    needle: String,
}

impl PathContains {
    /// Creates a predicate matching paths that contain `needle`.
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

impl Predicate for PathContains {
    type Subject = FetchRequest;

    fn check(&self, request: &FetchRequest) -> bool {
        request.path().contains(&self.needle)
    }
}

/// Matches request paths ending with a suffix.
#[derive(Debug, Clone)]
pub struct PathSuffix {
    suffix: String,
}

impl PathSuffix {
    /// Creates a predicate matching paths ending with `suffix`.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Predicate for PathSuffix {
    type Subject = FetchRequest;

    fn check(&self, request: &FetchRequest) -> bool {
        request.path().ends_with(&self.suffix)
    }
}

/// Matches request paths against a regular expression.
#[derive(Debug, Clone)]
pub struct PathMatches {
    pattern: Regex,
}

impl PathMatches {
    /// Compiles `pattern` into a path predicate.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Predicate for PathMatches {
    type Subject = FetchRequest;

    fn check(&self, request: &FetchRequest) -> bool {
        self.pattern.is_match(request.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Uri;
    use shellcache_core::PredicateExt;

    #[test]
    fn method_matches_exactly() {
        let get = Method::new(http::Method::GET);
        assert!(get.check(&FetchRequest::get(Uri::from_static("/"))));
        assert!(!get.check(&FetchRequest::new(
            http::Method::POST,
            Uri::from_static("/scores")
        )));
    }

    #[test]
    fn script_or_style() {
        let predicate = DestinationIn::new([Destination::Script, Destination::Style]);
        let script = FetchRequest::get(Uri::from_static("/js/main.js"))
            .with_destination(Destination::Script);
        let font = FetchRequest::get(Uri::from_static("/fonts/a.woff2"))
            .with_destination(Destination::Font);
        assert!(predicate.check(&script));
        assert!(!predicate.check(&font));
    }

    #[test]
    fn cross_origin_uses_worker_origin() {
        let predicate = CrossOrigin::new(Origin::parse("https://leapmultix.org").unwrap());
        assert!(predicate.check(&FetchRequest::get(Uri::from_static(
            "https://fonts.example.com/a.css"
        ))));
        assert!(!predicate.check(&FetchRequest::get(Uri::from_static("/css/general.css"))));
    }

    #[test]
    fn suffix_ignores_query_string() {
        let predicate = PathSuffix::new(".json");
        assert!(predicate.check(&FetchRequest::get(Uri::from_static(
            "/assets/translations/en.json?v=8"
        ))));
    }

    #[test]
    fn regex_and_navigation_combine() {
        let predicate = Mode::navigate().and(PathMatches::new("^/(index\\.html)?$").unwrap());
        assert!(predicate.check(&FetchRequest::navigate(Uri::from_static("/"))));
        assert!(!predicate.check(&FetchRequest::get(Uri::from_static("/"))));
    }
}
