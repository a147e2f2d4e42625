//! In-memory upstream used by the server tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use datasets_api::{Upstream, UpstreamError};
use datasets_types::UpstreamRequest;
use serde_json::{Value, json};

/// Records every request and replays scripted responses in order. Once the
/// script runs out every call answers `{}`.
#[derive(Default)]
pub(crate) struct FakeUpstream {
    responses: Mutex<VecDeque<Result<Value, UpstreamError>>>,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl FakeUpstream {
    pub(crate) fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_responses(responses: impl IntoIterator<Item = Result<Value, UpstreamError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::default(),
        })
    }

    pub(crate) fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn execute(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        self.requests.lock().expect("requests lock").push(request.clone());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }
}
