//! Tick source for the rest countdown.
//!
//! A loop rests by summing per-tick time deltas until the sum reaches its
//! interval. With [`Clock::Unscaled`] each delta is the real elapsed time;
//! with [`Clock::Scaled`] it is multiplied by a host-controlled factor, so
//! pausing the host (scale 0) pauses the countdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Shared, host-mutable time scale factor. Starts at 1.0.
#[derive(Debug, Clone)]
pub struct TimeScale(Arc<AtomicU64>);

impl TimeScale {
    pub fn new(scale: f64) -> Self {
        let this = Self(Arc::new(AtomicU64::new(1.0f64.to_bits())));
        this.set(scale);
        this
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Negative and non-finite factors are stored as 0.
    pub fn set(&self, scale: f64) {
        let scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
        self.0.store(scale.to_bits(), Ordering::Relaxed);
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Which time a loop measures its interval in.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    /// Real elapsed time.
    #[default]
    Unscaled,
    /// Elapsed time multiplied by a [`TimeScale`].
    Scaled(TimeScale),
}

impl Clock {
    fn scale(&self, delta: Duration) -> Duration {
        match self {
            Self::Unscaled => delta,
            // Saturates instead of overflowing on huge factors
            Self::Scaled(scale) => {
                Duration::try_from_secs_f64(delta.as_secs_f64() * scale.get())
                    .unwrap_or(Duration::MAX)
            }
        }
    }
}

/// Yields one time delta per host tick.
pub(crate) struct Ticker {
    clock: Clock,
    interval: Interval,
    last: Instant,
}

impl Ticker {
    pub(crate) fn new(clock: Clock, period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            clock,
            interval,
            last: Instant::now(),
        }
    }

    /// Restart delta measurement from now.
    pub(crate) fn reset(&mut self) {
        self.interval.reset();
        self.last = Instant::now();
    }

    /// Wait for the next tick and return the (scaled) time since the previous one.
    pub(crate) async fn tick(&mut self) -> Duration {
        let now = self.interval.tick().await;
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        self.clock.scale(delta)
    }
}
