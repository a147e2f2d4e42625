use datasets_types::{FieldSchema, OperationSchema, UpstreamRequest};
use serde::Deserialize;
use serde_json::json;

use super::{OperationArgs, from_args};
use crate::catalog::OperationDescriptor;
use crate::envelope::{ComparisonMode, EnvelopeShape};

const COMPARISON_TYPES: &[&str] = &["basic_stats", "gene_content", "assembly_quality"];
const MIN_COMPARED: usize = 2;
const MAX_COMPARED: usize = 10;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompareGenomesArgs {
    pub accessions: Vec<String>,
    pub comparison_type: String,
}

impl CompareGenomesArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::post("/genome/dataset_report", json!({ "accessions": self.accessions }))
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![OperationDescriptor {
        name: "compare_genomes",
        title: "Compare genomes",
        description: "Side-by-side dataset reports for 2 to 10 genome assemblies.",
        schema: OperationSchema {
            fields: vec![
                FieldSchema::string_array("accessions", "Genome assembly accessions to compare")
                    .items(MIN_COMPARED, MAX_COMPARED)
                    .required(),
                FieldSchema::string("comparison_type", "Aspect to compare")
                    .one_of(COMPARISON_TYPES)
                    .default_value(json!("basic_stats")),
            ],
            preconditions: vec![],
        },
        envelope: EnvelopeShape::Comparison {
            inputs: &["accessions"],
            mode: ComparisonMode::FromField("comparison_type"),
        },
        parser: |arguments| from_args(arguments).map(OperationArgs::CompareGenomes),
    }]
}
