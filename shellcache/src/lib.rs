//! # shellcache
//!
//! An offline-first cache-strategy dispatcher modelled on a progressive web
//! app service worker.
//!
//! A [`Worker`] owns two versioned partitions: the offline shell, stored once
//! at install, and the runtime partition, filled as requests are served. Each
//! request is routed through an ordered [`RouteTable`] to one of four
//! strategies or left to the host:
//!
//! | Requests | Strategy |
//! |----------|----------|
//! | non-`GET` | pass through |
//! | navigations | network, offline page on failure |
//! | cross-origin | pass through |
//! | images | cache first |
//! | translation JSON | stale-while-revalidate |
//! | scripts and styles | network first, cache on failure |
//!
//! Storage ([`backend::CacheStorage`]), the network ([`Upstream`]) and the
//! background executor ([`Offload`]) are injected, so the worker runs the same
//! against an in-memory store in tests and a real store behind a Tower stack.
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Storage re-exports.
pub mod backend;

/// Error types for the worker and its configuration.
///
/// - [`WorkerError`] covers install and activation failures
/// - [`ConfigError`] covers invalid configuration
pub mod error;

/// Worker configuration, partition naming and configurable routes.
pub mod config;

/// Lifecycle states and activation reports.
pub mod lifecycle;

/// Page-to-worker messages.
pub mod message;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module provides counters
/// and histograms for:
/// - Fetch outcomes by strategy and cache status
/// - Failed partition writes and deleted partitions
/// - Background revalidation tasks
pub mod metrics;

/// Background task offloading for stale-while-revalidate.
pub mod offload;

/// Request predicates used by the routing table.
pub mod predicates;

/// Routing table and strategies.
pub mod route;

/// Fetch outcomes.
pub mod strategy;

mod worker;

pub use config::{PartitionNames, WorkerConfig};
pub use error::{ConfigError, InstallFailure, WorkerError};
pub use lifecycle::{ActivationReport, WorkerState};
pub use message::{WorkerMessage, WorkerReply};
pub use route::{Route, RouteTable, Strategy};
pub use strategy::{FetchDecision, FetchOutcome};
pub use worker::{NotSet, Worker, WorkerBuilder};

pub use shellcache_core::{
    CacheStatus, Destination, FetchRequest, NetworkError, NetworkResult, Offload, Origin,
    RequestKey, RequestMode, ResponseSnapshot, ResponseSource, Upstream,
};
