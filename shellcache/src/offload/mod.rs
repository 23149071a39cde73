//! Background execution for stale-while-revalidate refreshes.
//!
//! A stale-while-revalidate hit answers from the runtime partition at once and
//! hands the network refresh to an [`OffloadManager`], which runs it on tokio
//! after the response has been delivered.
//!
//! # Example
//!
//! ```ignore
//! use shellcache::offload::{OffloadConfig, OffloadManager};
//!
//! let manager = OffloadManager::new(OffloadConfig::default());
//!
//! manager.spawn("revalidate", async {
//!     // fetch and store
//! });
//!
//! manager.wait_all().await;
//! ```

mod manager;
mod policy;

pub use manager::{OffloadHandle, OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, OffloadConfigBuilder, TimeoutPolicy};
