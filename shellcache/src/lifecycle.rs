//! Worker lifecycle state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use smol_str::SmolStr;
use tokio::sync::watch;
use tracing::info;

use crate::metrics;

/// Lifecycle of a worker.
///
/// ```text
/// Parsed → Installing → Installed → Activating → Activated
///              ↓
///          Redundant
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Constructed, install not started.
    #[default]
    Parsed,
    /// The app shell is being fetched.
    Installing,
    /// The app shell is stored.
    Installed,
    /// Old partitions are being removed.
    Activating,
    /// Controlling clients; fetches are intercepted.
    Activated,
    /// Install failed; this worker will never activate.
    Redundant,
}

impl WorkerState {
    /// Returns the state name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partitions removed by an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Partitions deleted.
    pub deleted: Vec<SmolStr>,
    /// Partitions whose deletion failed. They are retried by the next activation.
    pub failed: Vec<SmolStr>,
}

impl ActivationReport {
    /// `true` when every stale partition was removed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: watch::Sender<WorkerState>,
    skip_waiting: AtomicBool,
    controlling: AtomicBool,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: watch::Sender::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            controlling: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub(crate) fn transition(&self, next: WorkerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = %previous, to = %next, "worker state changed");
            metrics::record_transition(next);
        }
    }

    pub(crate) fn request_skip_waiting(&self) {
        if !self.skip_waiting.swap(true, Ordering::AcqRel) {
            info!("skip waiting requested");
        }
    }

    pub(crate) fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    pub(crate) fn claim(&self) {
        self.controlling.store(true, Ordering::Release);
        self.transition(WorkerState::Activated);
    }

    pub(crate) fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let lifecycle = Lifecycle::new();
        let mut rx = lifecycle.subscribe();
        assert_eq!(*rx.borrow(), WorkerState::Parsed);

        lifecycle.transition(WorkerState::Installing);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), WorkerState::Installing);

        lifecycle.claim();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), WorkerState::Activated);
        assert!(lifecycle.is_controlling());
    }
}
