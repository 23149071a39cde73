use http::StatusCode;
use shellcache_backend::StorageError;
use shellcache_core::NetworkError;
use thiserror::Error;

/// Errors surfaced by the worker lifecycle.
///
/// Fetch dispatch never fails; only install and activation report errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// An app shell resource could not be fetched; nothing was stored.
    #[error("install failed fetching `{url}`: {reason}")]
    Install {
        /// URL that failed.
        url: String,
        /// Why it failed.
        reason: InstallFailure,
    },

    /// The storage rejected an operation the lifecycle cannot do without.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A failed install made this worker redundant.
    #[error("worker is redundant and cannot be activated")]
    Redundant,
}

/// Cause of a failed app shell fetch.
#[derive(Debug, Error)]
pub enum InstallFailure {
    /// The network request failed.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The server answered with a non-2xx status.
    #[error("unexpected status {0}")]
    Status(StatusCode),
}

/// Errors building a worker from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("invalid configuration: {0}")]
    Yaml(String),

    /// A configured URL is not a valid URI.
    #[error("invalid URL `{0}`")]
    InvalidUrl(String),

    /// App shell entries must belong to the worker origin.
    #[error("app shell entry `{0}` is not same-origin")]
    CrossOriginShellEntry(String),

    /// The version tag is empty.
    #[error("version tag must not be empty")]
    EmptyVersion,

    /// The cache name prefix is empty.
    #[error("cache prefix must not be empty")]
    EmptyPrefix,

    /// `And`/`Or` matcher without operands.
    #[error("matcher list must not be empty")]
    EmptyMatcherList,

    /// Unknown HTTP method in a `Method` matcher.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    /// Malformed regular expression in a `Path` matcher.
    #[error(transparent)]
    InvalidRegex(#[from] regex::Error),
}
