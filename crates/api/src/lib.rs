//! Upstream client for the NCBI Datasets REST API.
//!
//! - [`ApiConfig`] holds the base address, optional credential and timeout.
//!   It is resolved once at startup and validated (HTTPS and an NCBI domain,
//!   or localhost with any scheme).
//! - [`DatasetsClient`] executes one [`UpstreamRequest`] per call with a fixed
//!   header set and returns the decoded JSON body.
//! - [`Upstream`] is the seam the dispatcher depends on, so tests can swap in
//!   an in-memory double.
//!
//! No retries, backoff or caching are performed; a failure is reported once.

use async_trait::async_trait;
use datasets_types::UpstreamRequest;
use serde_json::Value;

pub mod client;
pub mod config;
pub mod error;

pub use client::DatasetsClient;
pub use config::{ApiConfig, ConfigError, ConfigOverrides};
pub use error::UpstreamError;

/// Executes upstream request descriptors.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Issue exactly one HTTP request and return the decoded body.
    ///
    /// An empty success body decodes to `Value::Null`.
    async fn execute(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError>;
}
