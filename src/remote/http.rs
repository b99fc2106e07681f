//! reqwest-backed [`Transport`].
//!
//! Resources are addressed as `{base}/{resource}/~{method}`. Views are sent
//! as `GET` with query parameters, operations as `POST` with a JSON object
//! body. Any 2xx response is `Ok` and its body (or `null` when empty) is the
//! element; every other status maps to a [`ResultCode`] without an element.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde_json::Value;

use super::result::{CacheResult, ResultCode};
use super::transport::{Authorization, Params, Transport, TransportError};

/// HTTP transport bound to one cache base URL and credential.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    authorization: Authorization,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Transport without a request timeout: a stalled call stalls its caller.
    pub fn new(base_url: impl Into<String>, authorization: Authorization) -> Self {
        Self {
            base_url: base_url.into(),
            authorization,
            client: reqwest::Client::new(),
        }
    }

    /// Transport whose calls fail with [`TransportError::Request`] after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        authorization: Authorization,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            authorization,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, resource: &str, method: &str) -> String {
        format!(
            "{}/{}/~{}",
            self.base_url.trim_end_matches('/'),
            resource,
            method
        )
    }

    async fn send(
        &self,
        request: RequestBuilder,
        url: String,
    ) -> Result<CacheResult<Value>, TransportError> {
        let request = match self.authorization.header_value() {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status().as_u16();
        let code = ResultCode::from_http_status(status);
        if !code.is_ok() {
            tracing::debug!(
                target: "livecache::remote",
                url = %url,
                status,
                code = %code,
                "Cache call returned a failure status"
            );
            return Ok(CacheResult::failed(code));
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        parse_body(&body)
            .map(CacheResult::ok)
            .map_err(|source| TransportError::Decode { url, source })
    }
}

fn parse_body(body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn view(
        &self,
        resource: &str,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<Value>, TransportError> {
        let url = self.endpoint(resource, method);
        tracing::debug!(target: "livecache::remote", url = %url, ?params, "GET");
        let request = self.client.get(&url).query(params);
        self.send(request, url).await
    }

    async fn operation(
        &self,
        resource: &str,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<Value>, TransportError> {
        let url = self.endpoint(resource, method);
        tracing::debug!(target: "livecache::remote", url = %url, ?params, "POST");
        let request = self.client.post(&url).json(params);
        self.send(request, url).await
    }
}
