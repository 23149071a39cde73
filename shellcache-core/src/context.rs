//! Types describing where a dispatched response came from.

use smol_str::SmolStr;

/// Whether the response was served from a partition or had to go to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// A stored copy was returned.
    Hit,
    /// Nothing usable was stored; the network (or an error response) answered.
    #[default]
    Miss,
    /// A stored copy was returned while a background refresh replaces it.
    Stale,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
        }
    }
}

/// Source of a dispatched response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseSource {
    /// Live network response.
    #[default]
    Network,
    /// Stored copy read from the named partition.
    Partition(SmolStr),
    /// Synthesized network-error response; neither network nor cache could answer.
    Synthetic,
}

impl ResponseSource {
    /// Returns the source as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Partition(name) => name.as_str(),
            ResponseSource::Synthetic => "synthetic",
        }
    }
}
