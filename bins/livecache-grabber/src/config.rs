//! Configuration for the state grabber

use std::time::Duration;

use clap::Parser;
use livecache::grab::{Clock, GrabberConfig, TimeScale};

/// Live-cache state grabber
///
/// Periodically drains the state resource and logs every grabbed item.
#[derive(Parser, Debug)]
#[command(name = "livecache-grabber")]
#[command(about = "Drain live-cache state events and log them", long_about = None)]
pub struct Config {
    /// Cache service base URL
    #[arg(long, env = "LIVECACHE_URL", default_value = livecache::grab::DEFAULT_CACHE_URL)]
    pub cache_url: String,

    /// Bearer credential sent with every call
    #[arg(long, env = "LIVECACHE_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Resource key of the state collection
    #[arg(long, default_value = livecache::cache::DEFAULT_STATE_RESOURCE)]
    pub state_resource: String,

    /// Seconds to rest between drains (minimum 10)
    #[arg(long, default_value = "10")]
    pub interval: f64,

    /// Measure the interval in scaled time with this factor
    #[arg(long)]
    pub time_scale: Option<f64>,

    /// Restart this many seconds after a run fails (default: exit)
    #[arg(long)]
    pub restart_after: Option<u64>,
}

impl Config {
    pub fn grabber_config(&self) -> GrabberConfig {
        GrabberConfig {
            cache_url: self.cache_url.clone(),
            api_key: self.api_key.clone(),
            state_resource_key: self.state_resource.clone(),
            interval_secs: self.interval,
            ..GrabberConfig::default()
        }
    }

    pub fn clock(&self) -> Clock {
        match self.time_scale {
            Some(scale) => Clock::Scaled(TimeScale::new(scale)),
            None => Clock::Unscaled,
        }
    }

    pub fn restart_after(&self) -> Option<Duration> {
        self.restart_after.map(Duration::from_secs)
    }
}
