//! Metrics declaration and recording helpers.

use std::time::Duration;

use crate::lifecycle::WorkerState;
use crate::strategy::FetchOutcome;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    // Fetch outcome metrics

    /// Track number of responses served from a partition.
    pub static ref FETCH_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shellcache_fetch_hit_total",
            "Total number of responses served from a cache partition."
        );
        "shellcache_fetch_hit_total"
    };
    /// Track number of responses that were not found in a partition.
    pub static ref FETCH_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shellcache_fetch_miss_total",
            "Total number of responses not served from a cache partition."
        );
        "shellcache_fetch_miss_total"
    };
    /// Track number of stale responses served while revalidating.
    pub static ref FETCH_STALE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shellcache_fetch_stale_total",
            "Total number of stale responses served while revalidating."
        );
        "shellcache_fetch_stale_total"
    };
    /// Track number of requests left to the host.
    pub static ref FETCH_PASSTHROUGH_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shellcache_fetch_passthrough_total",
            "Total number of requests not intercepted."
        );
        "shellcache_fetch_passthrough_total"
    };
    /// Histogram of intercepted fetch duration.
    pub static ref FETCH_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shellcache_fetch_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of intercepted fetches in seconds."
        );
        "shellcache_fetch_duration_seconds"
    };

    // Storage metrics

    /// Track failed partition writes.
    pub static ref STORAGE_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "shellcache_storage_write_errors_total",
            "Total number of failed partition writes."
        );
        "shellcache_storage_write_errors_total"
    };
    /// Track partitions deleted during activation or clearing.
    pub static ref PARTITIONS_DELETED: &'static str = {
        metrics::describe_counter!(
            "shellcache_partitions_deleted_total",
            "Total number of cache partitions deleted."
        );
        "shellcache_partitions_deleted_total"
    };

    // Lifecycle metrics

    /// Track lifecycle transitions by target state.
    pub static ref LIFECYCLE_TRANSITIONS: &'static str = {
        metrics::describe_counter!(
            "shellcache_lifecycle_transitions_total",
            "Total number of worker state changes, labelled by the state entered."
        );
        "shellcache_lifecycle_transitions_total"
    };

    // Background refresh metrics

    /// Background tasks started, by kind.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "shellcache_offload_tasks_spawned_total",
            "Background tasks started by the offload manager."
        );
        "shellcache_offload_tasks_spawned_total"
    };
    /// Background tasks finished, by kind and outcome (`completed` or `timed_out`).
    pub static ref OFFLOAD_TASKS_FINISHED: &'static str = {
        metrics::describe_counter!(
            "shellcache_offload_tasks_finished_total",
            "Background tasks that ran to completion or were cancelled by their timeout."
        );
        "shellcache_offload_tasks_finished_total"
    };
    /// Refreshes skipped because the same request was already being refreshed.
    pub static ref OFFLOAD_TASKS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "shellcache_offload_tasks_deduplicated_total",
            "Refreshes skipped because one for the same request was running."
        );
        "shellcache_offload_tasks_deduplicated_total"
    };
    /// Background tasks currently running.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "shellcache_offload_tasks_active",
            "Background tasks currently running."
        );
        "shellcache_offload_tasks_active"
    };
    /// Wall time of background tasks.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shellcache_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Wall time of background tasks."
        );
        "shellcache_offload_task_duration_seconds"
    };
}

/// Record metrics for an intercepted fetch.
///
/// When the `metrics` feature is disabled, this function is a no-op
/// and will be eliminated by the compiler.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_outcome(outcome: &FetchOutcome, duration: Duration) {
    use shellcache_core::CacheStatus;

    let strategy = outcome.strategy.as_str();
    let source = outcome.source.as_str().to_string();

    metrics::histogram!(
        *FETCH_DURATION,
        "strategy" => strategy,
        "status" => outcome.status.as_str()
    )
    .record(duration.as_secs_f64());

    let counter = match outcome.status {
        CacheStatus::Hit => *FETCH_HIT_COUNTER,
        CacheStatus::Miss => *FETCH_MISS_COUNTER,
        CacheStatus::Stale => *FETCH_STALE_COUNTER,
    };
    metrics::counter!(counter, "strategy" => strategy, "source" => source).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_outcome(_outcome: &FetchOutcome, _duration: Duration) {}

/// Record a request that was left to the host.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_passthrough() {
    metrics::counter!(*FETCH_PASSTHROUGH_COUNTER).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_passthrough() {}

/// Record a failed partition write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write_error(partition: &str) {
    metrics::counter!(*STORAGE_WRITE_ERRORS, "partition" => partition.to_string()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write_error(_partition: &str) {}

/// Record deleted partitions.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_partitions_deleted(count: usize) {
    metrics::counter!(*PARTITIONS_DELETED).increment(count as u64);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_partitions_deleted(_count: usize) {}

/// Record a worker state change.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_transition(state: WorkerState) {
    metrics::counter!(*LIFECYCLE_TRANSITIONS, "state" => state.as_str()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_transition(_state: WorkerState) {}

/// Record a background task being started.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_spawned(kind: &str) {
    metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "kind" => kind.to_string()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_string()).increment(1.0);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_spawned(_kind: &str) {}

/// Record a refresh skipped as a duplicate.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_deduplicated(kind: &str) {
    metrics::counter!(*OFFLOAD_TASKS_DEDUPLICATED, "kind" => kind.to_string()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_deduplicated(_kind: &str) {}

/// Record a background task ending, either normally or by timeout.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_finished(kind: &str, elapsed: Duration, timed_out: bool) {
    let outcome = if timed_out { "timed_out" } else { "completed" };
    metrics::counter!(
        *OFFLOAD_TASKS_FINISHED,
        "kind" => kind.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_string()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind.to_string())
        .record(elapsed.as_secs_f64());
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_finished(_kind: &str, _elapsed: Duration, _timed_out: bool) {}
