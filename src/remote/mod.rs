//! Abstract remote contract shared by all handlers.

pub mod http;
pub mod resource;
pub mod result;
pub mod transport;

pub use http::HttpTransport;
pub use resource::{Resource, Root};
pub use result::{CacheResult, ResultCode};
pub use transport::{params, Authorization, Params, Transport, TransportError};
