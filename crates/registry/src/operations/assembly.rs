//! Assembly search, reports, batch lookup and quality metrics.

use datasets_types::{FieldSchema, OperationSchema, UpstreamRequest};
use datasets_util::build_path;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::genome::{ANNOTATION_FILE_TYPES, ASSEMBLY_LEVELS, dataset_report_by_accession};
use super::{OperationArgs, Paging, from_args, max_results_field, page_token_field};
use crate::catalog::OperationDescriptor;
use crate::envelope::EnvelopeShape;

const REPORT_TYPES: &[&str] = &["sequence", "annotation"];
const MAX_BATCH_ACCESSIONS: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchAssembliesArgs {
    pub query: String,
    pub assembly_level: Option<String>,
    pub reference_only: bool,
    pub released_after: Option<String>,
    #[serde(flatten)]
    pub paging: Paging,
}

impl SearchAssembliesArgs {
    pub fn request(&self) -> UpstreamRequest {
        let request = UpstreamRequest::get(build_path("/genome/taxon/{taxon}/dataset_report", &[("taxon", self.query.as_str())]))
            .query_opt("filters.assembly_level", self.assembly_level.as_deref())
            .query_flag("filters.reference_only", self.reference_only)
            .query_opt("filters.first_release_date", self.released_after.as_deref());
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetAssemblyInfoArgs {
    pub assembly_accession: String,
    pub include_annotation: bool,
}

impl GetAssemblyInfoArgs {
    pub fn request(&self) -> UpstreamRequest {
        dataset_report_by_accession(&self.assembly_accession, self.include_annotation)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetAssemblyReportsArgs {
    pub assembly_accession: String,
    pub report_type: String,
    #[serde(flatten)]
    pub paging: Paging,
}

impl GetAssemblyReportsArgs {
    pub fn request(&self) -> UpstreamRequest {
        let template = match self.report_type.as_str() {
            "annotation" => "/genome/accession/{accession}/annotation_report",
            _ => "/genome/accession/{accession}/sequence_reports",
        };
        let request = UpstreamRequest::get(build_path(template, &[("accession", self.assembly_accession.as_str())]));
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchAssemblyInfoArgs {
    pub accessions: Vec<String>,
    pub include_annotation: bool,
}

impl BatchAssemblyInfoArgs {
    pub fn request(&self) -> UpstreamRequest {
        let mut body = Map::new();
        body.insert("accessions".into(), json!(self.accessions));
        if self.include_annotation {
            body.insert("include_annotation_type".into(), json!(ANNOTATION_FILE_TYPES));
        }
        UpstreamRequest::post("/genome/dataset_report", Value::Object(body))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetAssemblyQualityArgs {
    pub assembly_accession: String,
}

impl GetAssemblyQualityArgs {
    pub fn request(&self) -> UpstreamRequest {
        dataset_report_by_accession(&self.assembly_accession, false)
    }
}

fn assembly_accession_field() -> FieldSchema {
    FieldSchema::string("assembly_accession", "Assembly accession, e.g. `GCA_000001405.29`").required()
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "search_assemblies",
            title: "Search assemblies",
            description: "Search genome assemblies for a taxon with level, reference and release-date filters.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("query", "Taxon name or id").required(),
                    FieldSchema::string("assembly_level", "Minimum assembly level").one_of(ASSEMBLY_LEVELS),
                    FieldSchema::boolean("reference_only", "Only reference assemblies").default_value(json!(false)),
                    FieldSchema::string("released_after", "Only assemblies released on or after this date (YYYY-MM-DD)"),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::search("assemblies"),
            parser: |arguments| from_args(arguments).map(OperationArgs::SearchAssemblies),
        },
        OperationDescriptor {
            name: "get_assembly_info",
            title: "Get assembly information",
            description: "Dataset report for an assembly accession.",
            schema: OperationSchema {
                fields: vec![
                    assembly_accession_field(),
                    FieldSchema::boolean("include_annotation", "Request GFF and GenBank annotation files")
                        .default_value(json!(true)),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("assembly_accession", &["include_annotation"]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetAssemblyInfo),
        },
        OperationDescriptor {
            name: "get_assembly_reports",
            title: "Get assembly reports",
            description: "Sequence or annotation reports for an assembly.",
            schema: OperationSchema {
                fields: vec![
                    assembly_accession_field(),
                    FieldSchema::string("report_type", "Kind of report")
                        .one_of(REPORT_TYPES)
                        .default_value(json!("sequence")),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("assembly_accession", &["report_type"]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetAssemblyReports),
        },
        OperationDescriptor {
            name: "batch_assembly_info",
            title: "Batch assembly information",
            description: "Dataset reports for up to 100 assembly accessions in one request.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string_array("accessions", "Assembly accessions")
                        .items(1, MAX_BATCH_ACCESSIONS)
                        .required(),
                    FieldSchema::boolean("include_annotation", "Request GFF and GenBank annotation files")
                        .default_value(json!(false)),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::batch("assemblies", "accessions"),
            parser: |arguments| from_args(arguments).map(OperationArgs::BatchAssemblyInfo),
        },
        OperationDescriptor {
            name: "get_assembly_quality",
            title: "Get assembly quality",
            description: "Assembly statistics, CheckM completeness and annotation summary for an assembly.",
            schema: OperationSchema {
                fields: vec![assembly_accession_field()],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::Fetch {
                id_field: Some("assembly_accession"),
                echo: &[],
                quality_summary: true,
            },
            parser: |arguments| from_args(arguments).map(OperationArgs::GetAssemblyQuality),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::super::test_support::request_for;
    use crate::OperationRegistry;
    use datasets_types::UpstreamMethod;
    use serde_json::{Value, json};

    #[test]
    fn search_assemblies_forwards_filters() {
        let request = request_for(
            "search_assemblies",
            json!({"query": "Drosophila", "reference_only": true, "released_after": "2020-01-01"}),
        );
        assert_eq!(request.path, "/genome/taxon/Drosophila/dataset_report");
        assert_eq!(request.query_value("filters.reference_only"), Some("true"));
        assert_eq!(request.query_value("filters.first_release_date"), Some("2020-01-01"));
        assert_eq!(request.query_value("filters.assembly_level"), None);
    }

    #[test]
    fn assembly_reports_switch_on_report_type() {
        let request = request_for("get_assembly_reports", json!({"assembly_accession": "GCF_1"}));
        assert_eq!(request.path, "/genome/accession/GCF_1/sequence_reports");

        let request = request_for(
            "get_assembly_reports",
            json!({"assembly_accession": "GCF_1", "report_type": "annotation"}),
        );
        assert_eq!(request.path, "/genome/accession/GCF_1/annotation_report");
    }

    #[test]
    fn batch_assembly_info_posts_accessions() {
        let request = request_for("batch_assembly_info", json!({"accessions": ["GCF_1", "GCA_2"], "include_annotation": true}));
        assert_eq!(request.method, UpstreamMethod::Post);
        assert_eq!(
            request.body,
            Some(json!({"accessions": ["GCF_1", "GCA_2"], "include_annotation_type": ["GENOME_GFF", "GENOME_GBFF"]}))
        );

        let request = request_for("batch_assembly_info", json!({"accessions": ["GCF_1"]}));
        assert_eq!(request.body, Some(json!({"accessions": ["GCF_1"]})));
    }

    #[test]
    fn batch_assembly_info_caps_the_list() {
        let descriptor = OperationRegistry::builtin().get("batch_assembly_info").expect("descriptor");
        let accessions = (0..101).map(|index| Value::from(format!("GCF_{index}"))).collect::<Vec<Value>>();
        let bundle = json!({ "accessions": accessions }).as_object().cloned().expect("object");
        assert_eq!(descriptor.validate(&bundle).unwrap_err().field, "accessions");
    }

    #[test]
    fn quality_uses_the_plain_dataset_report() {
        let request = request_for("get_assembly_quality", json!({"assembly_accession": "GCF_1"}));
        assert_eq!(request.path, "/genome/accession/GCF_1/dataset_report");
        assert!(request.query.is_empty());
    }
}
