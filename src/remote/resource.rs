//! Named resources on a cache root.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::http::HttpTransport;
use super::result::CacheResult;
use super::transport::{Authorization, Params, Transport, TransportError};

/// Entry point to one cache service: base address, credential and transport.
#[derive(Clone)]
pub struct Root {
    transport: Arc<dyn Transport>,
}

impl Root {
    /// Root served over HTTP at `base_url`.
    pub fn new(base_url: impl Into<String>, authorization: Authorization) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new(base_url, authorization)))
    }

    /// Root over any transport (tests, custom clients).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Bind a resource key on this root.
    pub fn resource(&self, key: impl Into<String>) -> Resource {
        Resource {
            key: key.into(),
            transport: Arc::clone(&self.transport),
        }
    }
}

/// A remote collection addressed by key.
#[derive(Clone)]
pub struct Resource {
    key: String,
    transport: Arc<dyn Transport>,
}

impl Resource {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run a view and deserialize its element into `T`.
    pub async fn view_to<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<T>, TransportError> {
        let raw = self.transport.view(&self.key, method, params).await?;
        self.deserialize(method, raw)
    }

    /// Run an operation and deserialize its element into `T`.
    pub async fn operation_to<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<T>, TransportError> {
        let raw = self.transport.operation(&self.key, method, params).await?;
        self.deserialize(method, raw)
    }

    /// Run an operation and return its acknowledgement untouched.
    pub async fn operation_to_json(
        &self,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<Value>, TransportError> {
        self.transport.operation(&self.key, method, params).await
    }

    fn deserialize<T: DeserializeOwned>(
        &self,
        method: &str,
        raw: CacheResult<Value>,
    ) -> Result<CacheResult<T>, TransportError> {
        match raw.into_result() {
            Ok(value) => serde_json::from_value(value).map(CacheResult::ok).map_err(|e| {
                TransportError::InvalidPayload {
                    resource: self.key.clone(),
                    method: method.to_string(),
                    reason: e.to_string(),
                }
            }),
            Err(code) => Ok(CacheResult::failed(code)),
        }
    }
}
