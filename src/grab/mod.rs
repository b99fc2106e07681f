//! Periodic state grabbing.

pub mod clock;
pub mod config;
pub mod error;
pub mod grab_loop;
pub mod processor;

pub use clock::{Clock, TimeScale};
pub use config::{clamp_interval, GrabberConfig, DEFAULT_CACHE_URL, MIN_INTERVAL};
pub use error::GrabError;
pub use grab_loop::{GrabLoop, Phase};
pub use processor::{FnErrorHandler, FnProcessor, GrabErrorHandler, ItemProcessor, NoopErrorHandler};
