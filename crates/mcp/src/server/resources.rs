//! `ncbi://` resources: one upstream fetch per URI, no argument schema.

use std::time::Instant;

use datasets_api::{Upstream, UpstreamError};
use datasets_types::UpstreamRequest;
use datasets_util::{build_path, decode_uri_segment};
use rmcp::model::{AnnotateAble, ErrorData, ListResourceTemplatesResult, RawResourceTemplate, ReadResourceResult, ResourceContents};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::server::errors::{internal_error, invalid_request_error, not_found_error};

const SCHEME: &str = "ncbi://";
const JSON_MIME: &str = "application/json";
const SEARCH_PAGE_SIZE: u32 = 20;
const SEARCHABLE_TYPES: &[&str] = &["genome", "assembly", "gene", "taxonomy", "virus", "protein"];

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTarget {
    Genome { accession: String },
    Gene { gene_id: String },
    Taxonomy { tax_id: String },
    Assembly { accession: String },
    Search { data_type: String, query: String },
}

impl ResourceTarget {
    /// Parse `ncbi://<family>/...`; `None` when no template matches.
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(SCHEME)?;
        let (family, rest) = rest.split_once('/')?;
        if family == "search" {
            let (data_type, query) = rest.split_once('/')?;
            let query = decode_uri_segment(query);
            if !SEARCHABLE_TYPES.contains(&data_type) || query.trim().is_empty() {
                return None;
            }
            return Some(ResourceTarget::Search {
                data_type: data_type.to_string(),
                query,
            });
        }
        if rest.is_empty() || rest.contains('/') {
            return None;
        }
        let identifier = decode_uri_segment(rest);
        if identifier.trim().is_empty() {
            return None;
        }
        match family {
            "genome" => Some(ResourceTarget::Genome { accession: identifier }),
            "assembly" => Some(ResourceTarget::Assembly { accession: identifier }),
            "gene" if is_numeric_id(&identifier) => Some(ResourceTarget::Gene { gene_id: identifier }),
            "taxonomy" if is_numeric_id(&identifier) => Some(ResourceTarget::Taxonomy { tax_id: identifier }),
            _ => None,
        }
    }

    pub fn request(&self) -> UpstreamRequest {
        match self {
            ResourceTarget::Genome { accession } | ResourceTarget::Assembly { accession } => {
                UpstreamRequest::get(build_path("/genome/accession/{accession}/dataset_report", &[("accession", accession.as_str())]))
            }
            ResourceTarget::Gene { gene_id } => UpstreamRequest::get(build_path("/gene/id/{gene_id}", &[("gene_id", gene_id.as_str())])),
            ResourceTarget::Taxonomy { tax_id } => {
                UpstreamRequest::get(build_path("/taxonomy/taxon/{tax_id}/dataset_report", &[("tax_id", tax_id.as_str())]))
            }
            ResourceTarget::Search { data_type, query } => UpstreamRequest::get(build_path("/{data_type}/search", &[("data_type", data_type.as_str())]))
                .query("q", query)
                .query("page_size", SEARCH_PAGE_SIZE),
        }
    }
}

fn is_numeric_id(identifier: &str) -> bool {
    identifier.bytes().all(|byte| byte.is_ascii_digit())
}

/// Build resource templates for parameterized resource reads.
pub fn list_resource_templates() -> ListResourceTemplatesResult {
    let templates = [
        ("ncbi://genome/{accession}", "genome", "Genome by accession", "Dataset report for a genome assembly accession"),
        ("ncbi://gene/{gene_id}", "gene", "Gene by id", "Gene report for an NCBI gene id"),
        ("ncbi://taxonomy/{tax_id}", "taxonomy", "Taxon by id", "Taxonomy report for an NCBI taxonomy id"),
        (
            "ncbi://assembly/{assembly_accession}",
            "assembly",
            "Assembly by accession",
            "Dataset report for an assembly accession",
        ),
        (
            "ncbi://search/{data_type}/{query}",
            "search",
            "Search by data type",
            "First page of search results; data_type is one of genome, assembly, gene, taxonomy, virus, protein",
        ),
    ]
    .into_iter()
    .map(|(uri_template, name, title, description)| {
        RawResourceTemplate {
            uri_template: uri_template.to_string(),
            name: name.to_string(),
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            mime_type: Some(JSON_MIME.to_string()),
            icons: None,
        }
        .no_annotation()
    })
    .collect();

    ListResourceTemplatesResult::with_all_items(templates)
}

/// Resolve `uri` and fetch it. Failures are protocol errors.
pub async fn read_resource(upstream: &dyn Upstream, uri: &str) -> Result<ReadResourceResult, ErrorData> {
    let started = Instant::now();
    let Some(target) = ResourceTarget::parse(uri) else {
        return Err(invalid_request_error(
            "NCBI_RESOURCE_URI_INVALID",
            format!("unsupported resource uri: {uri}"),
            json!({ "uri": uri }),
            "Use one of the ncbi:// templates from resources/templates/list.",
        ));
    };

    let payload = upstream.execute(&target.request()).await.map_err(|error| {
        warn!(uri, error = %error, "resource read failed");
        upstream_error(uri, &error)
    })?;
    info!(uri, duration_ms = started.elapsed().as_millis() as u64, "resource read");
    Ok(text_resource(uri, JSON_MIME, render_json(&payload)))
}

fn upstream_error(uri: &str, error: &UpstreamError) -> ErrorData {
    let context = json!({ "uri": uri, "upstream_status": error.status() });
    if error.is_not_found() {
        return not_found_error(
            "NCBI_RESOURCE_NOT_FOUND",
            error.to_string(),
            context,
            "Check the identifier in the resource uri.",
        );
    }
    let retryable = matches!(error, UpstreamError::Timeout { .. } | UpstreamError::Network(_));
    internal_error("NCBI_UPSTREAM_FAILED", error.to_string(), context, retryable, "Retry the read later.")
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn text_resource(uri: &str, mime_type: &str, text: String) -> ReadResourceResult {
    ReadResourceResult {
        contents: vec![ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(mime_type.to_string()),
            text,
            meta: None,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testing::FakeUpstream;
    use rmcp::model::ErrorCode;

    #[test]
    fn parses_every_template_family() {
        assert_eq!(
            ResourceTarget::parse("ncbi://genome/GCF_000001405.40"),
            Some(ResourceTarget::Genome {
                accession: "GCF_000001405.40".into()
            })
        );
        assert_eq!(ResourceTarget::parse("ncbi://gene/672"), Some(ResourceTarget::Gene { gene_id: "672".into() }));
        assert_eq!(
            ResourceTarget::parse("ncbi://taxonomy/9606"),
            Some(ResourceTarget::Taxonomy { tax_id: "9606".into() })
        );
        assert_eq!(
            ResourceTarget::parse("ncbi://assembly/GCA_000001405.29"),
            Some(ResourceTarget::Assembly {
                accession: "GCA_000001405.29".into()
            })
        );
    }

    #[test]
    fn rejects_unmatched_uris() {
        for uri in [
            "ncbi://genome/",
            "ncbi://genome/a/b",
            "ncbi://gene/BRCA1",
            "ncbi://taxonomy/human",
            "ncbi://plasmid/1",
            "ncbi://search/gene/",
            "ncbi://search/plasmid/x",
            "http://genome/GCF_1",
            "ncbi://genome",
        ] {
            assert_eq!(ResourceTarget::parse(uri), None, "{uri}");
        }
    }

    #[test]
    fn search_query_is_decoded_and_paged() {
        let target = ResourceTarget::parse("ncbi://search/gene/BRCA1%20homo").expect("target");
        assert_eq!(
            target,
            ResourceTarget::Search {
                data_type: "gene".into(),
                query: "BRCA1 homo".into()
            }
        );
        let request = target.request();
        assert_eq!(request.path, "/gene/search");
        assert_eq!(request.query_value("q"), Some("BRCA1 homo"));
        assert_eq!(request.query_value("page_size"), Some("20"));
    }

    #[test]
    fn lists_five_templates() {
        let templates = list_resource_templates().resource_templates;
        assert_eq!(templates.len(), 5);
        assert!(templates.iter().all(|template| template.uri_template.starts_with(SCHEME)));
    }

    #[tokio::test]
    async fn read_returns_pretty_json_text() {
        let upstream = FakeUpstream::with_responses([Ok(json!({"reports": [{"tax_id": 9606}]}))]);

        let result = read_resource(upstream.as_ref(), "ncbi://taxonomy/9606").await.expect("resource");

        assert_eq!(upstream.requests()[0].path, "/taxonomy/taxon/9606/dataset_report");
        let ResourceContents::TextResourceContents { uri, mime_type, text, .. } = &result.contents[0] else {
            panic!("expected text contents");
        };
        assert_eq!(uri, "ncbi://taxonomy/9606");
        assert_eq!(mime_type.as_deref(), Some(JSON_MIME));
        let parsed: Value = serde_json::from_str(text).expect("json text");
        assert_eq!(parsed["reports"][0]["tax_id"], json!(9606));
    }

    #[tokio::test]
    async fn malformed_uri_is_invalid_request_without_upstream_call() {
        let upstream = FakeUpstream::empty();

        let error = read_resource(upstream.as_ref(), "ncbi://nowhere/1").await.unwrap_err();

        assert_eq!(error.code, ErrorCode::INVALID_REQUEST);
        assert!(upstream.requests().is_empty());
    }

    #[tokio::test]
    async fn upstream_failures_map_to_distinct_codes() {
        let upstream = FakeUpstream::with_responses([
            Err(UpstreamError::Status {
                status: 404,
                message: "not found".into(),
            }),
            Err(UpstreamError::Timeout { timeout_ms: 30_000 }),
        ]);

        let missing = read_resource(upstream.as_ref(), "ncbi://gene/999999999").await.unwrap_err();
        assert_eq!(missing.code, ErrorCode::RESOURCE_NOT_FOUND);

        let slow = read_resource(upstream.as_ref(), "ncbi://gene/672").await.unwrap_err();
        assert_eq!(slow.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(slow.data.expect("data")["retryable"], json!(true));
    }
}
