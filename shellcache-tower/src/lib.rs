//! Tower middleware for the shellcache worker.
//!
//! This crate provides [`ServiceWorkerLayer`], a Tower [`Layer`] that puts a
//! [`Worker`] in front of any HTTP service, the way a browser puts a service
//! worker in front of the network. The wrapped service plays the network:
//! the worker calls it on cache misses, for network-first fetches and for
//! background revalidation.
//!
//! # Behavior
//!
//! - Before the worker has activated, requests go straight to the inner
//!   service.
//! - Afterwards each request is matched against the worker's routing table.
//!   Pass-through routes reach the inner service unchanged, request body
//!   included.
//! - Every other route is answered by the worker from a buffered
//!   [`ResponseSnapshot`](shellcache::ResponseSnapshot).
//!
//! # Response Headers
//!
//! Responses answered by the worker carry a cache status header:
//!
//! | Header Value | Meaning |
//! |--------------|---------|
//! | `HIT` | Served from a partition |
//! | `MISS` | Fetched from the inner service, or the network-error response |
//! | `STALE` | Served from a partition while a background refresh runs |
//!
//! The default header name is `x-cache-status`. Customize it with
//! [`ServiceWorkerLayer::cache_status_header`]. Pass-through responses are
//! left untouched.
//!
//! # Quick Start
//!
//! ```ignore
//! use shellcache::{Origin, Worker, WorkerConfig};
//! use shellcache_memory::MemoryStorage;
//! use shellcache_tower::{ServiceWorkerLayer, TowerUpstream};
//! use tower::{ServiceBuilder, service_fn};
//!
//! let config = WorkerConfig::new(Origin::parse("https://leapmultix.org")?);
//! let worker = Worker::new(config, MemoryStorage::new())?;
//!
//! let network = service_fn(fetch_from_origin);
//! let upstream = TowerUpstream::<_, Full<Bytes>, Full<Bytes>>::new(network.clone());
//! worker.on_install(upstream).await?;
//! worker.on_activate().await?;
//!
//! let service = ServiceBuilder::new()
//!     .layer(ServiceWorkerLayer::new(worker))
//!     .service(network);
//! ```

#![warn(missing_docs)]

pub mod body;
/// Future types for the service.
pub mod future;
/// The Tower layer.
pub mod layer;
/// The Tower service.
pub mod service;
pub mod upstream;

pub use body::ShellBody;
pub use future::ServiceWorkerFuture;
pub use layer::{DEFAULT_STATUS_HEADER, ServiceWorkerLayer};
pub use service::ServiceWorkerService;
pub use upstream::{TowerUpstream, TowerUpstreamFuture};

#[doc(no_inline)]
pub use shellcache::Worker;
