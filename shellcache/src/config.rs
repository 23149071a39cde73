//! Worker configuration.
//!
//! [`WorkerConfig`] holds everything that varies between deployments: the
//! origin the worker serves, the partition naming scheme, the app shell and
//! optionally a custom routing table. The defaults reproduce the LeapMultix
//! application, so only `origin` has to be provided:
//!
//! ```
//! use shellcache::config::WorkerConfig;
//!
//! let config = WorkerConfig::from_yaml(r#"
//! origin: "https://leapmultix.org"
//! version: v9
//! "#).unwrap();
//!
//! assert_eq!(config.partition_names().runtime(), "leapmultix-runtime-v9");
//! assert_eq!(config.app_shell.len(), 8);
//! ```

use std::time::Duration;

use http::Uri;
use serde::{Deserialize, Serialize};
use shellcache_core::{Always, And, Destination, Not, Or, Origin, PredicateExt, RequestMode};

use crate::error::ConfigError;
use crate::predicates::{
    BoxPredicate, CrossOrigin, DestinationIn, Method, Mode, PathContains, PathMatches, PathSuffix,
};
use crate::route::{Route, RouteTable, Strategy};

const DEFAULT_PREFIX: &str = "leapmultix";
const DEFAULT_VERSION: &str = "v8";
const DEFAULT_OFFLINE_URL: &str = "/offline.html";
const DEFAULT_TRANSLATIONS_DIR: &str = "/assets/translations/";
const DEFAULT_APP_SHELL: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/favicon.ico",
    "/assets/icons/panda-192.png",
    "/assets/icons/panda-512.png",
    "/css/general.css",
    "/css/responsive-unified.css",
];

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_owned()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_owned()
}

fn default_offline_url() -> String {
    DEFAULT_OFFLINE_URL.to_owned()
}

fn default_translations_dir() -> String {
    DEFAULT_TRANSLATIONS_DIR.to_owned()
}

fn default_app_shell() -> Vec<String> {
    DEFAULT_APP_SHELL.iter().map(|url| (*url).to_owned()).collect()
}

/// Configuration of a [`Worker`](crate::Worker).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Origin the worker serves; requests elsewhere are cross-origin.
    pub origin: Origin,
    /// Prefix of every partition name owned by this application.
    #[serde(default = "default_prefix")]
    pub cache_prefix: String,
    /// Version tag appended to partition names.
    #[serde(default = "default_version")]
    pub version: String,
    /// Page served to navigations when the network is unreachable.
    #[serde(default = "default_offline_url")]
    pub offline_url: String,
    /// Resources stored at install time, in order.
    #[serde(default = "default_app_shell")]
    pub app_shell: Vec<String>,
    /// Directory holding translation JSON files.
    #[serde(default = "default_translations_dir")]
    pub translations_dir: String,
    /// Upper bound on a background revalidation (e.g., "10s", "500ms").
    #[serde(default, with = "humantime_serde")]
    pub revalidate_timeout: Option<Duration>,
    /// Custom routing table. The standard table is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RouteConfig>>,
}

impl WorkerConfig {
    /// Default configuration for `origin`.
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            cache_prefix: default_prefix(),
            version: default_version(),
            offline_url: default_offline_url(),
            app_shell: default_app_shell(),
            translations_dir: default_translations_dir(),
            revalidate_timeout: None,
            routes: None,
        }
    }

    /// Starts a builder from the defaults for `origin`.
    pub fn builder(origin: Origin) -> WorkerConfigBuilder {
        WorkerConfigBuilder {
            config: Self::new(origin),
        }
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_saphyr::from_str(yaml).map_err(|err| ConfigError::Yaml(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks names and URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.version.is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        for url in self.shell_urls() {
            let uri: Uri = url
                .parse()
                .map_err(|_| ConfigError::InvalidUrl(url.to_owned()))?;
            if !self.origin.is_same_origin(&uri) {
                return Err(ConfigError::CrossOriginShellEntry(url.to_owned()));
            }
        }
        Ok(())
    }

    /// Names of the partitions for the configured version.
    pub fn partition_names(&self) -> PartitionNames {
        PartitionNames::new(&self.cache_prefix, &self.version)
    }

    /// URLs fetched at install: the offline page, then the app shell.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn shell_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::with_capacity(self.app_shell.len() + 1);
        for url in std::iter::once(&self.offline_url).chain(&self.app_shell) {
            if !urls.contains(&url.as_str()) {
                urls.push(url);
            }
        }
        urls
    }

    /// Builds the routing table.
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        match &self.routes {
            None => Ok(RouteTable::standard(&self.origin, &self.translations_dir)),
            Some(routes) => {
                let mut table = RouteTable::new();
                for route in routes {
                    table.push(route.clone().into_route(&self.origin)?);
                }
                Ok(table)
            }
        }
    }
}

/// Builder for [`WorkerConfig`].
#[derive(Debug, Clone)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Sets the partition name prefix.
    pub fn cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.cache_prefix = prefix.into();
        self
    }

    /// Sets the version tag.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Sets the offline fallback page.
    pub fn offline_url(mut self, url: impl Into<String>) -> Self {
        self.config.offline_url = url.into();
        self
    }

    /// Replaces the app shell.
    pub fn app_shell<I>(mut self, urls: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.config.app_shell = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the translations directory.
    pub fn translations_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.translations_dir = dir.into();
        self
    }

    /// Bounds background revalidations.
    pub fn revalidate_timeout(mut self, timeout: Duration) -> Self {
        self.config.revalidate_timeout = Some(timeout);
        self
    }

    /// Replaces the standard routing table.
    pub fn routes(mut self, routes: Vec<RouteConfig>) -> Self {
        self.config.routes = Some(routes);
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<WorkerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Partition names derived from a prefix and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNames {
    offline_kind: String,
    runtime_kind: String,
    version: String,
    offline: String,
    runtime: String,
}

impl PartitionNames {
    /// Names for `prefix` at `version`.
    pub fn new(prefix: &str, version: &str) -> Self {
        let offline_kind = format!("{prefix}-offline-");
        let runtime_kind = format!("{prefix}-runtime-");
        Self {
            offline: format!("{offline_kind}{version}"),
            runtime: format!("{runtime_kind}{version}"),
            offline_kind,
            runtime_kind,
            version: version.to_owned(),
        }
    }

    /// The offline-shell partition.
    pub fn offline(&self) -> &str {
        &self.offline
    }

    /// The runtime partition.
    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    fn version_of<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.offline_kind.as_str())
            .or_else(|| name.strip_prefix(self.runtime_kind.as_str()))
    }

    /// Whether `name` belongs to this application, whatever its version.
    pub fn is_owned(&self, name: &str) -> bool {
        self.version_of(name).is_some()
    }

    /// Whether `name` belongs to this application under another version.
    pub fn is_stale(&self, name: &str) -> bool {
        self.version_of(name)
            .is_some_and(|version| version != self.version)
    }
}

/// One configured route.
///
/// ```yaml
/// name: fonts
/// match:
///   And:
///     - Destination: [font]
///     - Not: CrossOrigin
/// strategy: CacheFirst
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route name, used in logs.
    #[serde(default)]
    pub name: Option<String>,
    /// Which requests the route applies to.
    #[serde(rename = "match")]
    pub matcher: MatcherConfig,
    /// How matching requests are answered.
    pub strategy: Strategy,
}

impl RouteConfig {
    fn into_route(self, origin: &Origin) -> Result<Route, ConfigError> {
        let name = self
            .name
            .unwrap_or_else(|| self.strategy.as_str().to_owned());
        Ok(Route::new(
            name,
            self.matcher.into_predicate(origin)?,
            self.strategy,
        ))
    }
}

/// Declarative request matcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatcherConfig {
    /// HTTP method, e.g. `GET`.
    Method(String),
    /// Request mode, e.g. `navigate`.
    Mode(RequestMode),
    /// Any of the listed destinations.
    Destination(Vec<Destination>),
    /// Requests leaving the worker origin.
    CrossOrigin,
    /// Path contains a substring.
    PathContains(String),
    /// Path ends with a suffix.
    PathSuffix(String),
    /// Path matches a regular expression.
    Path(String),
    /// All operands match.
    And(Vec<MatcherConfig>),
    /// At least one operand matches.
    Or(Vec<MatcherConfig>),
    /// The operand does not match.
    Not(Box<MatcherConfig>),
    /// Every request.
    Any,
}

impl MatcherConfig {
    /// Compiles the matcher into a predicate.
    pub fn into_predicate(self, origin: &Origin) -> Result<BoxPredicate, ConfigError> {
        Ok(match self {
            MatcherConfig::Method(method) => {
                let method = http::Method::from_bytes(method.as_bytes())
                    .map_err(|_| ConfigError::InvalidMethod(method))?;
                Method::new(method).boxed()
            }
            MatcherConfig::Mode(mode) => Mode::new(mode).boxed(),
            MatcherConfig::Destination(destinations) => DestinationIn::new(destinations).boxed(),
            MatcherConfig::CrossOrigin => CrossOrigin::new(origin.clone()).boxed(),
            MatcherConfig::PathContains(needle) => PathContains::new(needle).boxed(),
            MatcherConfig::PathSuffix(suffix) => PathSuffix::new(suffix).boxed(),
            MatcherConfig::Path(pattern) => PathMatches::new(&pattern)?.boxed(),
            MatcherConfig::And(operands) => {
                let mut iter = operands.into_iter();
                let first = iter.next().ok_or(ConfigError::EmptyMatcherList)?;
                iter.try_fold(first.into_predicate(origin)?, |acc, operand| {
                    Ok::<_, ConfigError>(And::new(acc, operand.into_predicate(origin)?).boxed())
                })?
            }
            MatcherConfig::Or(operands) => {
                let mut iter = operands.into_iter();
                let first = iter.next().ok_or(ConfigError::EmptyMatcherList)?;
                iter.try_fold(first.into_predicate(origin)?, |acc, operand| {
                    Ok::<_, ConfigError>(Or::new(acc, operand.into_predicate(origin)?).boxed())
                })?
            }
            MatcherConfig::Not(operand) => Not::new(operand.into_predicate(origin)?).boxed(),
            MatcherConfig::Any => Always::new().boxed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellcache_core::{FetchRequest, Predicate};

    fn origin() -> Origin {
        Origin::parse("https://leapmultix.org").unwrap()
    }

    #[test]
    fn version_tags_compare_exactly() {
        let names = PartitionNames::new("leapmultix", "v8");
        assert!(names.is_stale("leapmultix-runtime-v7"));
        assert!(names.is_stale("leapmultix-offline-v18"));
        assert!(!names.is_stale("leapmultix-runtime-v8"));
        assert!(!names.is_stale("otherapp-runtime-v1"));
        assert!(!names.is_owned("leapmultix-v8"));
    }

    #[test]
    fn shell_urls_start_with_offline_page() {
        let config = WorkerConfig::builder(origin())
            .app_shell(["/", "/offline.html", "/index.html"])
            .build()
            .unwrap();
        assert_eq!(config.shell_urls(), ["/offline.html", "/", "/index.html"]);
    }

    #[test]
    fn rejects_cross_origin_shell_entries() {
        let err = WorkerConfig::builder(origin())
            .app_shell(["/", "https://cdn.example/lib.js"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::CrossOriginShellEntry(url) if url == "https://cdn.example/lib.js"));
    }

    #[test]
    fn empty_operand_lists_are_rejected() {
        let err = MatcherConfig::Or(Vec::new())
            .into_predicate(&origin())
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMatcherList));
    }

    #[test]
    fn matcher_tree_compiles() {
        let matcher = MatcherConfig::And(vec![
            MatcherConfig::Destination(vec![Destination::Font]),
            MatcherConfig::Not(Box::new(MatcherConfig::CrossOrigin)),
        ])
        .into_predicate(&origin())
        .unwrap();

        let local = FetchRequest::get(Uri::from_static("/fonts/a.woff2"))
            .with_destination(Destination::Font);
        let remote = FetchRequest::get(Uri::from_static("https://fonts.example/a.woff2"))
            .with_destination(Destination::Font);
        assert!(matcher.check(&local));
        assert!(!matcher.check(&remote));
    }
}
