//! Grab loop configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::DEFAULT_STATE_RESOURCE;
use crate::remote::{Authorization, Root};

/// Shortest interval a loop may rest between drains.
pub const MIN_INTERVAL: Duration = Duration::from_secs(10);

pub const DEFAULT_CACHE_URL: &str = "http://localhost:6666";

/// Period of the tick source driving the rest countdown.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Raise an interval to [`MIN_INTERVAL`] when it is shorter.
pub fn clamp_interval(interval: Duration) -> Duration {
    interval.max(MIN_INTERVAL)
}

/// Settings for a [`GrabLoop`](super::GrabLoop).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GrabberConfig {
    /// Base URL of the cache service.
    pub cache_url: String,
    /// Bearer credential. Empty means no `Authorization` header.
    pub api_key: String,
    /// Resource key of the state collection.
    pub state_resource_key: String,
    /// Seconds to rest between drains. Values under 10 are raised to 10.
    pub interval_secs: f64,
    /// Tick period in milliseconds.
    pub tick_millis: u64,
}

impl Default for GrabberConfig {
    fn default() -> Self {
        Self {
            cache_url: DEFAULT_CACHE_URL.to_string(),
            api_key: String::new(),
            state_resource_key: DEFAULT_STATE_RESOURCE.to_string(),
            interval_secs: MIN_INTERVAL.as_secs_f64(),
            tick_millis: DEFAULT_TICK.as_millis() as u64,
        }
    }
}

impl GrabberConfig {
    /// The interval after the floor is applied. Negative or non-finite
    /// values count as zero.
    pub fn effective_interval(&self) -> Duration {
        clamp_interval(Duration::try_from_secs_f64(self.interval_secs).unwrap_or(Duration::ZERO))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    pub fn authorization(&self) -> Authorization {
        Authorization::bearer(self.api_key.clone())
    }

    /// HTTP root for this configuration.
    pub fn root(&self) -> Root {
        Root::new(self.cache_url.clone(), self.authorization())
    }
}
