//! Abstract transport consumed by every resource handler.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::result::CacheResult;

/// String-keyed call parameters, kept ordered so requests are reproducible.
pub type Params = BTreeMap<String, String>;

/// Build [`Params`] from key/value pairs.
pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Faults below the result-code level: the call did not produce a readable
/// answer at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} is not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected payload from {resource}/~{method}: {reason}")]
    InvalidPayload {
        resource: String,
        method: String,
        reason: String,
    },

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Credential sent with every request as `Authorization: <scheme> <credential>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub scheme: String,
    pub credential: String,
}

impl Authorization {
    pub fn new(scheme: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            credential: credential.into(),
        }
    }

    pub fn bearer(credential: impl Into<String>) -> Self {
        Self::new("Bearer", credential)
    }

    /// Header value, or `None` when there is no credential to send.
    pub fn header_value(&self) -> Option<String> {
        if self.credential.is_empty() {
            None
        } else {
            Some(format!("{} {}", self.scheme, self.credential))
        }
    }
}

/// The two call shapes the cache service exposes.
///
/// Implementations report service-side failures through the returned
/// [`CacheResult`] code and reserve `Err` for transport faults.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read-only call: `method` on `resource` with query parameters.
    async fn view(
        &self,
        resource: &str,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<Value>, TransportError>;

    /// Mutating call: `method` on `resource` with body parameters.
    async fn operation(
        &self,
        resource: &str,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<Value>, TransportError>;
}
