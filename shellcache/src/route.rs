//! Ordered routing table mapping requests to fetch strategies.
//!
//! A [`RouteTable`] is a list of `(predicate, strategy)` entries evaluated in
//! order; the first matching entry wins and a request matching nothing is
//! passed through to the host.

use std::fmt;

use serde::{Deserialize, Serialize};
use shellcache_core::{Destination, FetchRequest, Origin, Predicate, PredicateExt};
use smol_str::SmolStr;

use crate::predicates::{BoxPredicate, CrossOrigin, DestinationIn, Method, Mode, PathContains, PathSuffix};

/// How a matched request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Not intercepted; the host handles the request natively.
    PassThrough,
    /// Network only, falling back to the offline page when the network fails.
    NavigationFallback,
    /// Runtime partition first, network on a miss.
    CacheFirst,
    /// Runtime partition immediately, refreshed from the network in the background.
    StaleWhileRevalidate,
    /// Network first, runtime partition when the network fails.
    NetworkFirst,
}

impl Strategy {
    /// Returns the strategy name used in logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::PassThrough => "pass_through",
            Strategy::NavigationFallback => "navigation_fallback",
            Strategy::CacheFirst => "cache_first",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
            Strategy::NetworkFirst => "network_first",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a routing table.
pub struct Route {
    name: SmolStr,
    predicate: BoxPredicate,
    strategy: Strategy,
}

impl Route {
    /// Creates a route.
    pub fn new(name: impl Into<SmolStr>, predicate: BoxPredicate, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            predicate,
            strategy,
        }
    }

    /// Route name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strategy applied to matching requests.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Whether `request` matches this route.
    pub fn matches(&self, request: &FetchRequest) -> bool {
        self.predicate.check(request)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("predicate", &self.predicate)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Ordered list of routes, first match wins.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates an empty table; every request passes through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route.
    pub fn route<P>(mut self, name: impl Into<SmolStr>, predicate: P, strategy: Strategy) -> Self
    where
        P: Predicate<Subject = FetchRequest> + Send + Sync + 'static,
    {
        self.routes.push(Route::new(name, Box::new(predicate), strategy));
        self
    }

    /// Appends an already built route.
    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// The standard offline-first table.
    ///
    /// 1. non-`GET` → pass through
    /// 2. navigation → network, offline page on failure
    /// 3. cross-origin → pass through
    /// 4. image → cache first
    /// 5. `.json` under `translations_dir` → stale-while-revalidate
    /// 6. script or style → network first
    ///
    /// Everything else passes through.
    pub fn standard(origin: &Origin, translations_dir: &str) -> Self {
        Self::new()
            .route(
                "non-get",
                Method::new(http::Method::GET).not(),
                Strategy::PassThrough,
            )
            .route("navigation", Mode::navigate(), Strategy::NavigationFallback)
            .route(
                "cross-origin",
                CrossOrigin::new(origin.clone()),
                Strategy::PassThrough,
            )
            .route(
                "images",
                DestinationIn::new([Destination::Image]),
                Strategy::CacheFirst,
            )
            .route(
                "translations",
                PathContains::new(translations_dir).and(PathSuffix::new(".json")),
                Strategy::StaleWhileRevalidate,
            )
            .route(
                "scripts-and-styles",
                DestinationIn::new([Destination::Script, Destination::Style]),
                Strategy::NetworkFirst,
            )
    }

    /// Returns the first route matching `request`.
    pub fn resolve(&self, request: &FetchRequest) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(request))
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Uri;
    use shellcache_core::RequestMode;

    fn table() -> RouteTable {
        RouteTable::standard(
            &Origin::parse("https://leapmultix.org").unwrap(),
            "/assets/translations/",
        )
    }

    fn strategy(request: &FetchRequest) -> Option<Strategy> {
        table().resolve(request).map(Route::strategy)
    }

    #[test]
    fn non_get_passes_through_before_anything_else() {
        let request = FetchRequest::new(http::Method::POST, Uri::from_static("/"))
            .with_mode(RequestMode::Navigate);
        assert_eq!(strategy(&request), Some(Strategy::PassThrough));
    }

    #[test]
    fn cross_origin_navigation_still_falls_back() {
        let request = FetchRequest::navigate(Uri::from_static("https://other.example/"));
        assert_eq!(strategy(&request), Some(Strategy::NavigationFallback));
    }

    #[test]
    fn cross_origin_image_passes_through() {
        let request = FetchRequest::get(Uri::from_static("https://cdn.example/a.png"))
            .with_destination(Destination::Image);
        assert_eq!(strategy(&request), Some(Strategy::PassThrough));
    }

    #[test]
    fn resource_types_map_to_strategies() {
        let image = FetchRequest::get(Uri::from_static("/assets/icons/panda-512.png"))
            .with_destination(Destination::Image);
        let translation = FetchRequest::get(Uri::from_static("/assets/translations/fr.json"));
        let style = FetchRequest::get(Uri::from_static("/css/general.css"))
            .with_destination(Destination::Style);
        let script = FetchRequest::get(Uri::from_static("/js/main.js"))
            .with_destination(Destination::Script);

        assert_eq!(strategy(&image), Some(Strategy::CacheFirst));
        assert_eq!(strategy(&translation), Some(Strategy::StaleWhileRevalidate));
        assert_eq!(strategy(&style), Some(Strategy::NetworkFirst));
        assert_eq!(strategy(&script), Some(Strategy::NetworkFirst));
    }

    #[test]
    fn unmatched_requests_have_no_route() {
        let font = FetchRequest::get(Uri::from_static("/fonts/game.woff2"))
            .with_destination(Destination::Font);
        let api = FetchRequest::get(Uri::from_static("/api/scores.json"));
        assert_eq!(strategy(&font), None);
        assert_eq!(strategy(&api), None);
    }
}
