use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use devisio_core::BackendConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Request(String),
    #[error("transport could not decode response body: {0}")]
    Decode(String),
}

/// Wire seam to the REST backend. The production implementation is
/// [`HttpTransport`]; tests drive the typed endpoints through an in-memory
/// fake instead.
#[async_trait]
pub trait BackendTransport: Send + Sync {
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<JsonResponse, TransportError>;

    /// Binary endpoint (PDF rendering). Returns status and raw bytes.
    async fn request_bytes(&self, path: &str) -> Result<(u16, Vec<u8>), TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| TransportError::Request(error.to_string()))?;
        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl BackendTransport for HttpTransport {
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<JsonResponse, TransportError> {
        let url = self.url(path);
        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response =
            request.send().await.map_err(|error| TransportError::Request(error.to_string()))?;
        let status = response.status().as_u16();
        let bytes =
            response.bytes().await.map_err(|error| TransportError::Request(error.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|error| TransportError::Decode(error.to_string()))?
        };

        Ok(JsonResponse { status, body })
    }

    async fn request_bytes(&self, path: &str) -> Result<(u16, Vec<u8>), TransportError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;
        let status = response.status().as_u16();
        let bytes =
            response.bytes().await.map_err(|error| TransportError::Request(error.to_string()))?;
        Ok((status, bytes.to_vec()))
    }
}
