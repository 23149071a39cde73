//! How the offload manager treats background refreshes.

use std::time::Duration;

/// What happens to a background refresh that outlives its budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Refreshes run for as long as the network takes.
    #[default]
    None,
    /// The refresh is dropped once the duration elapses; the stored copy stays.
    Cancel(Duration),
    /// A warning is logged once the duration elapses; the refresh keeps going.
    Warn(Duration),
}

impl TimeoutPolicy {
    /// `Cancel` after `timeout`, or no bound at all.
    pub fn cancel_after(timeout: Option<Duration>) -> Self {
        timeout.map_or(TimeoutPolicy::None, TimeoutPolicy::Cancel)
    }
}

/// Settings of an [`OffloadManager`](super::OffloadManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffloadConfig {
    /// Budget applied to every spawned task.
    pub timeout_policy: TimeoutPolicy,
    /// When set, a refresh keyed by a request is skipped while an earlier
    /// refresh of the same request is still running.
    pub deduplicate: bool,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            timeout_policy: TimeoutPolicy::None,
            deduplicate: true,
        }
    }
}

impl OffloadConfig {
    /// Starts from the defaults: no timeout, deduplication on.
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Fluent construction of an [`OffloadConfig`].
#[derive(Debug, Clone, Default)]
pub struct OffloadConfigBuilder {
    config: OffloadConfig,
}

impl OffloadConfigBuilder {
    /// Same as [`OffloadConfig::builder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the timeout policy.
    pub fn timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.config.timeout_policy = policy;
        self
    }

    /// Shorthand for `timeout_policy(TimeoutPolicy::Cancel(duration))`.
    pub fn timeout(self, duration: Duration) -> Self {
        self.timeout_policy(TimeoutPolicy::Cancel(duration))
    }

    /// Turns per-request deduplication on or off.
    pub fn deduplicate(mut self, enabled: bool) -> Self {
        self.config.deduplicate = enabled;
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> OffloadConfig {
        self.config
    }
}
