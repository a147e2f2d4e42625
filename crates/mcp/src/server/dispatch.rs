//! Per-invocation tool dispatch.
//!
//! Every call walks `Received → Validating → Mapping → Requesting →
//! Normalizing → Completed` and drops to `Failed` from wherever it stops. No
//! state survives the call.

use std::sync::Arc;
use std::time::Instant;

use datasets_api::{Upstream, UpstreamError};
use datasets_registry::{OperationRegistry, RequestPlan};
use datasets_types::{UpstreamRequest, ValidationError};
use datasets_util::redact_sensitive;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStage {
    Received,
    Validating,
    Mapping,
    Requesting,
    Normalizing,
    Completed,
    Failed,
}

impl DispatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStage::Received => "received",
            DispatchStage::Validating => "validating",
            DispatchStage::Mapping => "mapping",
            DispatchStage::Requesting => "requesting",
            DispatchStage::Normalizing => "normalizing",
            DispatchStage::Completed => "completed",
            DispatchStage::Failed => "failed",
        }
    }
}

/// Failure classes reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClassification {
    InvalidArguments,
    NotFound,
    MethodNotFound,
    UpstreamError,
    InternalError,
}

impl ErrorClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClassification::InvalidArguments => "invalid_arguments",
            ErrorClassification::NotFound => "not_found",
            ErrorClassification::MethodNotFound => "method_not_found",
            ErrorClassification::UpstreamError => "upstream_error",
            ErrorClassification::InternalError => "internal_error",
        }
    }
}

/// A failed invocation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation} failed while {}: {message}", .stage.as_str())]
pub struct DispatchError {
    pub operation: String,
    pub classification: ErrorClassification,
    /// Stage in progress when the invocation failed.
    pub stage: DispatchStage,
    pub message: String,
    pub field: Option<String>,
    pub upstream_status: Option<u16>,
}

impl DispatchError {
    /// Flagged tool result body.
    pub fn to_envelope(&self) -> Value {
        let mut envelope = json!({
            "error": true,
            "classification": self.classification,
            "message": self.message,
            "operation": self.operation,
            "stage": self.stage,
        });
        if let Some(field) = &self.field {
            envelope["field"] = json!(field);
        }
        if let Some(status) = self.upstream_status {
            envelope["upstream_status"] = json!(status);
        }
        envelope
    }
}

/// Tracks the stage of one invocation for logging and error reporting.
struct Invocation<'a> {
    operation: &'a str,
    stage: DispatchStage,
    started: Instant,
}

impl<'a> Invocation<'a> {
    fn start(operation: &'a str) -> Self {
        debug!(operation, stage = DispatchStage::Received.as_str(), "tool call received");
        Self {
            operation,
            stage: DispatchStage::Received,
            started: Instant::now(),
        }
    }

    fn enter(&mut self, stage: DispatchStage) {
        debug!(operation = self.operation, from = self.stage.as_str(), to = stage.as_str(), "dispatch stage");
        self.stage = stage;
    }

    fn fail(&self, classification: ErrorClassification, message: impl Into<String>) -> DispatchError {
        let error = DispatchError {
            operation: self.operation.to_string(),
            classification,
            stage: self.stage,
            message: message.into(),
            field: None,
            upstream_status: None,
        };
        warn!(
            operation = self.operation,
            stage = self.stage.as_str(),
            to = DispatchStage::Failed.as_str(),
            classification = classification.as_str(),
            message = %redact_sensitive(&error.message),
            duration_ms = self.started.elapsed().as_millis() as u64,
            "tool call failed"
        );
        error
    }

    fn invalid_arguments(&self, error: &ValidationError) -> DispatchError {
        DispatchError {
            field: Some(error.field.clone()),
            ..self.fail(ErrorClassification::InvalidArguments, error.to_string())
        }
    }

    fn upstream_failure(&self, error: &UpstreamError) -> DispatchError {
        DispatchError {
            upstream_status: error.status(),
            ..self.fail(ErrorClassification::UpstreamError, error.to_string())
        }
    }

    fn complete(&mut self) {
        self.enter(DispatchStage::Completed);
        info!(
            operation = self.operation,
            duration_ms = self.started.elapsed().as_millis() as u64,
            "tool call completed"
        );
    }
}

/// Routes tool calls through the operation table to the upstream service.
#[derive(Clone)]
pub struct Dispatcher {
    registry: &'static OperationRegistry,
    upstream: Arc<dyn Upstream>,
}

impl Dispatcher {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self::with_registry(OperationRegistry::builtin(), upstream)
    }

    pub fn with_registry(registry: &'static OperationRegistry, upstream: Arc<dyn Upstream>) -> Self {
        Self { registry, upstream }
    }

    pub fn registry(&self) -> &'static OperationRegistry {
        self.registry
    }

    pub fn upstream(&self) -> &dyn Upstream {
        self.upstream.as_ref()
    }

    /// Run one invocation to completion and return its envelope.
    pub async fn dispatch(&self, operation: &str, arguments: Map<String, Value>) -> Result<Value, DispatchError> {
        let mut invocation = Invocation::start(operation);
        let Some(descriptor) = self.registry.get(operation) else {
            return Err(invocation.fail(ErrorClassification::MethodNotFound, format!("unknown tool `{operation}`")));
        };

        invocation.enter(DispatchStage::Validating);
        let validated = descriptor
            .validate(&arguments)
            .map_err(|error| invocation.invalid_arguments(&error))?;

        invocation.enter(DispatchStage::Mapping);
        let args = descriptor
            .parse(validated.clone())
            .map_err(|error| invocation.fail(ErrorClassification::InternalError, format!("argument mapping failed: {error}")))?;
        let plan = args.plan();

        invocation.enter(DispatchStage::Requesting);
        let payload = match plan {
            RequestPlan::Direct(request) => self.send(&invocation, &request).await?,
            RequestPlan::Lookup(lookup) => {
                // A 404 here is an empty lookup, not an upstream failure.
                let found = match self.execute(&invocation, &lookup.request).await {
                    Ok(found) => found,
                    Err(error) if error.is_not_found() => Value::Null,
                    Err(error) => return Err(invocation.upstream_failure(&error)),
                };
                let Some(request) = lookup.resolve(&found) else {
                    return Err(invocation.fail(
                        ErrorClassification::NotFound,
                        format!("no {} found for {}", lookup.target.label(), lookup.subject),
                    ));
                };
                self.send(&invocation, &request).await?
            }
        };

        invocation.enter(DispatchStage::Normalizing);
        let envelope = descriptor.envelope.normalize(&validated, payload);
        invocation.complete();
        Ok(envelope)
    }

    async fn send(&self, invocation: &Invocation<'_>, request: &UpstreamRequest) -> Result<Value, DispatchError> {
        self.execute(invocation, request)
            .await
            .map_err(|error| invocation.upstream_failure(&error))
    }

    async fn execute(&self, invocation: &Invocation<'_>, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        debug!(
            operation = invocation.operation,
            method = request.method.as_str(),
            path = %request.path,
            "upstream request"
        );
        self.upstream.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testing::FakeUpstream;
    use datasets_types::UpstreamMethod;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object arguments")
    }

    #[tokio::test]
    async fn genome_info_defaults_to_annotation_files() {
        let upstream = FakeUpstream::with_responses([Ok(json!({"reports": [{"accession": "GCF_000005845.2"}]}))]);
        let dispatcher = Dispatcher::new(upstream.clone());

        let envelope = dispatcher
            .dispatch("get_genome_info", args(json!({"accession": "GCF_000005845.2"})))
            .await
            .expect("envelope");

        let requests = upstream.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/genome/accession/GCF_000005845.2/dataset_report");
        assert_eq!(requests[0].query_value("include_annotation_type"), Some("GENOME_GFF,GENOME_GBFF"));
        assert_eq!(envelope["accession"], json!("GCF_000005845.2"));
        assert_eq!(envelope["include_annotation"], json!(true));
        assert_eq!(envelope["data"]["reports"][0]["accession"], json!("GCF_000005845.2"));
    }

    #[tokio::test]
    async fn symbol_without_organism_fails_before_any_request() {
        let upstream = FakeUpstream::empty();
        let dispatcher = Dispatcher::new(upstream.clone());

        let error = dispatcher
            .dispatch("get_gene_info", args(json!({"gene_symbol": "BRCA1"})))
            .await
            .unwrap_err();

        assert_eq!(error.classification, ErrorClassification::InvalidArguments);
        assert_eq!(error.stage, DispatchStage::Validating);
        assert_eq!(error.field.as_deref(), Some("organism"));
        assert!(upstream.requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() {
        let upstream = FakeUpstream::empty();
        let dispatcher = Dispatcher::new(upstream.clone());

        let error = dispatcher.dispatch("get_everything", Map::new()).await.unwrap_err();

        assert_eq!(error.classification, ErrorClassification::MethodNotFound);
        assert_eq!(error.stage, DispatchStage::Received);
        assert!(upstream.requests().is_empty());
        let envelope = error.to_envelope();
        assert_eq!(envelope["error"], json!(true));
        assert_eq!(envelope["classification"], json!("method_not_found"));
        assert_eq!(envelope["stage"], json!("received"));
        assert!(envelope.get("field").is_none());
    }

    #[tokio::test]
    async fn continuation_token_round_trips_unmodified() {
        let token = "eNpz/0lVy+8K%2BSo=";
        let upstream = FakeUpstream::with_responses([
            Ok(json!({"reports": [{"accession": "GCF_1"}], "total_count": 2, "next_page_token": token})),
            Ok(json!({"reports": [{"accession": "GCF_2"}], "total_count": 2})),
        ]);
        let dispatcher = Dispatcher::new(upstream.clone());

        let first = dispatcher
            .dispatch("search_genomes", args(json!({"organism": "Escherichia coli", "max_results": 1})))
            .await
            .expect("first page");
        assert_eq!(first["total_count"], json!(2));
        assert_eq!(first["returned_count"], json!(1));
        let next = first["next_page_token"].as_str().expect("token").to_string();

        let second = dispatcher
            .dispatch(
                "search_genomes",
                args(json!({"organism": "Escherichia coli", "max_results": 1, "page_token": next})),
            )
            .await
            .expect("second page");
        assert!(second.get("next_page_token").is_none());

        let requests = upstream.requests();
        assert_eq!(requests[0].query_value("page_token"), None);
        assert_eq!(requests[1].query_value("page_token"), Some(token));
    }

    #[tokio::test]
    async fn batch_keeps_requested_ids_verbatim() {
        let upstream = FakeUpstream::with_responses([Ok(json!({"reports": [{"gene": {"gene_id": "672"}}]}))]);
        let dispatcher = Dispatcher::new(upstream.clone());

        let envelope = dispatcher
            .dispatch("batch_gene_info", args(json!({"gene_ids": [672, 7157, 99999999]})))
            .await
            .expect("envelope");

        assert_eq!(envelope["requested_gene_ids"], json!([672, 7157, 99999999]));
        assert_eq!(envelope["requested_count"], json!(3));
        assert_eq!(envelope["returned_count"], json!(1));
        assert_eq!(upstream.requests()[0].method, UpstreamMethod::Post);
    }

    #[tokio::test]
    async fn boundary_list_sizes_are_accepted() {
        let upstream = FakeUpstream::empty();
        let dispatcher = Dispatcher::new(upstream.clone());
        let accessions = |count: usize| (0..count).map(|index| format!("GCF_{index:09}.1")).collect::<Vec<String>>();

        for count in [2, 10] {
            let envelope = dispatcher
                .dispatch("compare_genomes", args(json!({"accessions": accessions(count)})))
                .await
                .expect("comparison");
            assert_eq!(envelope["accessions"].as_array().map(Vec::len), Some(count));
            assert_eq!(envelope["comparison_type"], json!("basic_stats"));
        }

        let tax_ids = (1..=50).collect::<Vec<u64>>();
        let envelope = dispatcher
            .dispatch("get_phylogenetic_tree", args(json!({"tax_ids": tax_ids})))
            .await
            .expect("tree");
        assert_eq!(envelope["comparison_type"], json!("phylogenetic_tree"));

        let error = dispatcher
            .dispatch("compare_genomes", args(json!({"accessions": accessions(11)})))
            .await
            .unwrap_err();
        assert_eq!(error.field.as_deref(), Some("accessions"));
        assert_eq!(upstream.requests().len(), 3);
    }

    #[tokio::test]
    async fn repeated_fetch_yields_identical_envelopes() {
        let report = json!({"reports": [{"gene": {"gene_id": "672", "symbol": "BRCA1"}}]});
        let upstream = FakeUpstream::with_responses([Ok(report.clone()), Ok(report)]);
        let dispatcher = Dispatcher::new(upstream.clone());

        let first = dispatcher.dispatch("get_gene_info", args(json!({"gene_id": 672}))).await.expect("first");
        let second = dispatcher.dispatch("get_gene_info", args(json!({"gene_id": 672}))).await.expect("second");

        assert_eq!(first, second);
        assert_eq!(upstream.requests()[0], upstream.requests()[1]);
    }

    #[tokio::test]
    async fn symbol_lookup_feeds_primary_request() {
        let upstream = FakeUpstream::with_responses([
            Ok(json!({"reports": [{"gene": {"gene_id": "672"}}]})),
            Ok(json!({"reports": [{"gene": {"gene_id": "672", "symbol": "BRCA1"}}]})),
        ]);
        let dispatcher = Dispatcher::new(upstream.clone());

        dispatcher
            .dispatch("get_gene_info", args(json!({"gene_symbol": "BRCA1", "organism": "Homo sapiens"})))
            .await
            .expect("envelope");

        let requests = upstream.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/gene/symbol/BRCA1/taxon/Homo%20sapiens");
        assert_eq!(requests[1].path, "/gene/id/672");
    }

    #[tokio::test]
    async fn empty_lookup_is_not_found() {
        let upstream = FakeUpstream::with_responses([Ok(json!({"reports": []}))]);
        let dispatcher = Dispatcher::new(upstream.clone());

        let error = dispatcher
            .dispatch("get_organism_info", args(json!({"organism": "Nonexistent beast"})))
            .await
            .unwrap_err();

        assert_eq!(error.classification, ErrorClassification::NotFound);
        assert_eq!(error.stage, DispatchStage::Requesting);
        assert!(error.message.contains("Nonexistent beast"), "{}", error.message);
        assert_eq!(upstream.requests().len(), 1);
    }

    #[tokio::test]
    async fn lookup_miss_is_reported_once_as_not_found() {
        let upstream = FakeUpstream::with_responses([Err(UpstreamError::Status {
            status: 404,
            message: "no match".into(),
        })]);
        let dispatcher = Dispatcher::new(upstream.clone());

        let error = dispatcher
            .dispatch("get_gene_info", args(json!({"gene_symbol": "NOPE1", "organism": "Homo sapiens"})))
            .await
            .unwrap_err();

        assert_eq!(error.classification, ErrorClassification::NotFound);
        assert_eq!(error.upstream_status, None);
        assert!(error.message.contains("NOPE1"), "{}", error.message);
        assert_eq!(upstream.requests().len(), 1);
    }

    #[tokio::test]
    async fn lookup_server_error_stays_an_upstream_error() {
        let upstream = FakeUpstream::with_responses([Err(UpstreamError::Status {
            status: 503,
            message: "busy".into(),
        })]);
        let dispatcher = Dispatcher::new(upstream.clone());

        let error = dispatcher
            .dispatch("get_organism_info", args(json!({"organism": "Danio rerio"})))
            .await
            .unwrap_err();

        assert_eq!(error.classification, ErrorClassification::UpstreamError);
        assert_eq!(error.upstream_status, Some(503));
        assert_eq!(upstream.requests().len(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_carries_status_and_message() {
        let upstream = FakeUpstream::with_responses([Err(UpstreamError::Status {
            status: 400,
            message: "Invalid accession".into(),
        })]);
        let dispatcher = Dispatcher::new(upstream.clone());

        let error = dispatcher
            .dispatch("get_assembly_info", args(json!({"assembly_accession": "nope"})))
            .await
            .unwrap_err();

        assert_eq!(error.classification, ErrorClassification::UpstreamError);
        assert_eq!(error.upstream_status, Some(400));
        assert!(error.message.contains("Invalid accession"));
        assert_eq!(error.to_envelope()["upstream_status"], json!(400));
    }
}
