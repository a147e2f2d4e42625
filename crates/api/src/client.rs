use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use datasets_types::{UpstreamMethod, UpstreamRequest};
use datasets_util::redact_sensitive;
use reqwest::{Client, RequestBuilder, header};
use serde_json::Value;
use tracing::{debug, warn};

use crate::Upstream;
use crate::config::{ApiConfig, ConfigError};
use crate::error::UpstreamError;

/// Name of the header that carries the NCBI credential.
pub const API_KEY_HEADER: &str = "api-key";

/// Thin wrapper around a configured `reqwest::Client` for NCBI Datasets access.
///
/// Default headers (`Accept`, `Content-Type`, `User-Agent` and the optional
/// `api-key`) and the timeout are fixed when the client is built.
#[derive(Debug, Clone)]
pub struct DatasetsClient {
    config: Arc<ApiConfig>,
    http: Client,
}

impl DatasetsClient {
    pub fn new(config: Arc<ApiConfig>) -> Result<Self, ConfigError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        default_headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        let user_agent =
            header::HeaderValue::from_str(&config.user_agent).map_err(|_| ConfigError::InvalidHeader("User-Agent"))?;
        default_headers.insert(header::USER_AGENT, user_agent);
        if let Some(api_key) = &config.api_key {
            let mut value = header::HeaderValue::from_str(api_key).map_err(|_| ConfigError::InvalidHeader(API_KEY_HEADER))?;
            value.set_sensitive(true);
            default_headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeout)
            .build()
            .map_err(|error| ConfigError::Client(error.to_string()))?;

        debug!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms(),
            has_api_key = config.api_key.is_some(),
            "upstream client configured"
        );
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, request: &UpstreamRequest) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, request.path);
        let mut builder = match request.method {
            UpstreamMethod::Get => self.http.get(url),
            UpstreamMethod::Post => self.http.post(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }

    fn transport_error(&self, error: reqwest::Error) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout {
                timeout_ms: self.config.timeout_ms(),
            }
        } else {
            UpstreamError::Network(redact_sensitive(&error.to_string()))
        }
    }
}

#[async_trait]
impl Upstream for DatasetsClient {
    async fn execute(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let start = Instant::now();
        let method = request.method.as_str();
        debug!(
            method,
            path = %request.path,
            query_parameter_count = request.query.len(),
            has_body = request.body.is_some(),
            "upstream request started"
        );

        let response = self.request(request).send().await.map_err(|error| {
            let error = self.transport_error(error);
            warn!(
                method,
                path = %request.path,
                error = %error,
                duration_ms = start.elapsed().as_millis(),
                "upstream request failed"
            );
            error
        })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|error| self.transport_error(error))?;

        if !status.is_success() {
            let error = UpstreamError::from_status(status.as_u16(), status.canonical_reason(), &body_text);
            warn!(
                method,
                path = %request.path,
                status = %status,
                error = %error,
                duration_ms = start.elapsed().as_millis(),
                "upstream request failed"
            );
            return Err(error);
        }

        if body_text.trim().is_empty() {
            debug!(
                method,
                path = %request.path,
                status = %status,
                duration_ms = start.elapsed().as_millis(),
                "upstream request completed with empty response"
            );
            return Ok(Value::Null);
        }

        let parsed = serde_json::from_str::<Value>(&body_text).map_err(|error| {
            warn!(
                method,
                path = %request.path,
                status = %status,
                body_len = body_text.len(),
                duration_ms = start.elapsed().as_millis(),
                "upstream response was not valid JSON"
            );
            UpstreamError::Decode(error.to_string())
        })?;

        debug!(
            method,
            path = %request.path,
            status = %status,
            duration_ms = start.elapsed().as_millis(),
            "upstream request completed"
        );
        Ok(parsed)
    }
}
