//! Offload trait for background task execution.
//!
//! This module provides the [`Offload`] trait which abstracts over
//! different implementations for spawning background tasks.

use std::future::Future;

use smol_str::SmolStr;

use crate::key::RequestKey;

/// Trait for spawning background tasks.
///
/// The stale-while-revalidate strategy returns the stored copy immediately
/// and hands the network refresh to an `Offload` so it runs after the
/// response has been delivered.
///
/// # Implementations
///
/// The primary implementation is `OffloadManager` in the `shellcache` crate,
/// which runs tasks on tokio with optional deduplication and timeouts.
///
/// # Clone bound
///
/// Implementors should use `Arc` internally to ensure all cloned instances
/// share the same configuration and state.
pub trait Offload: Send + Sync + Clone {
    /// Spawn a future to be executed in the background.
    ///
    /// * `kind` - A label categorizing the task type (e.g., "revalidate").
    ///   Used for metrics and tracing.
    /// * `future` - The future to execute in the background.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Spawn a future tied to a request key.
    ///
    /// Implementations may skip the task when one for the same key is still
    /// in flight. The default just spawns it.
    fn spawn_for_key<F>(&self, key: &RequestKey, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let _ = key;
        self.spawn(kind, future);
    }
}
