#![warn(missing_docs)]
//! # shellcache-core
//!
//! Core traits and types for the shellcache offline-first cache dispatcher.
//!
//! This crate provides the foundational abstractions that keep the dispatcher
//! **host-agnostic**. It defines the types that the dispatcher in `shellcache`
//! reasons about and the seams through which a host plugs in its network and
//! its background executor:
//!
//! - **Describe** an outgoing request ([`FetchRequest`], [`RequestMode`], [`Destination`])
//! - **Identify** cached entries ([`RequestKey`]) and origins ([`Origin`])
//! - **Snapshot** responses so they can be stored and replayed ([`ResponseSnapshot`])
//! - **Decide** which strategy handles a request ([`Predicate`])
//! - **Call** the network ([`Upstream`])
//! - **Execute** background revalidation ([`Offload`])
//!
//! Storage lives one layer up, in `shellcache-backend`.

pub mod context;
pub mod key;
pub mod offload;
pub mod origin;
pub mod predicate;
pub mod request;
pub mod response;
pub mod upstream;

pub use context::{CacheStatus, ResponseSource};
pub use key::{KeyError, RequestKey};
pub use offload::Offload;
pub use origin::{InvalidOrigin, Origin};
pub use predicate::{Always, And, Not, Or, Predicate, PredicateExt};
pub use request::{Destination, FetchRequest, RequestMode};
pub use response::{NETWORK_ERROR_HEADER, ResponseSnapshot};
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use upstream::{BoxError, NetworkError, NetworkResult, Upstream};
