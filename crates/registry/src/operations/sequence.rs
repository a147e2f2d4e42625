//! Sequence similarity search and sequence validation. Both run upstream.

use datasets_types::{FieldSchema, OperationSchema, UpstreamRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{OperationArgs, from_args};
use crate::catalog::OperationDescriptor;
use crate::envelope::EnvelopeShape;

const PROGRAMS: &[&str] = &["blastn", "blastp", "blastx", "tblastn", "tblastx"];
const DATABASES: &[&str] = &["nt", "nr", "refseq_rna", "refseq_protein", "swissprot", "pdb"];
const SEQUENCE_TYPES: &[&str] = &["dna", "rna", "protein"];
const MAX_VALIDATED_SEQUENCES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastSearchArgs {
    pub sequence: String,
    pub program: String,
    pub database: String,
    pub expect_value: f64,
    pub max_target_seqs: u64,
}

impl BlastSearchArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::post("/blast", json!(self))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateSequencesArgs {
    pub sequences: Vec<String>,
    pub sequence_type: String,
}

impl ValidateSequencesArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::post("/sequence/validate", json!(self))
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "blast_search",
            title: "BLAST search",
            description: "Submit a sequence similarity search to the upstream BLAST service.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("sequence", "Query sequence (raw or FASTA)").required(),
                    FieldSchema::string("program", "BLAST program").one_of(PROGRAMS).default_value(json!("blastn")),
                    FieldSchema::string("database", "Target database").one_of(DATABASES).default_value(json!("nt")),
                    FieldSchema::number("expect_value", "Expectation value threshold")
                        .range(0.0, 1000.0)
                        .default_value(json!(10)),
                    FieldSchema::integer("max_target_seqs", "Maximum number of aligned sequences")
                        .range(1.0, 5000.0)
                        .default_value(json!(100)),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::passthrough(),
            parser: |arguments| from_args(arguments).map(OperationArgs::BlastSearch),
        },
        OperationDescriptor {
            name: "validate_sequences",
            title: "Validate sequences",
            description: "Check up to 10 sequences for valid DNA, RNA or protein alphabets.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string_array("sequences", "Sequences to validate")
                        .items(1, MAX_VALIDATED_SEQUENCES)
                        .required(),
                    FieldSchema::string("sequence_type", "Expected alphabet")
                        .one_of(SEQUENCE_TYPES)
                        .default_value(json!("dna")),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::Batch {
                key: "results",
                requested_field: "sequences",
                upstream_key: "results",
            },
            parser: |arguments| from_args(arguments).map(OperationArgs::ValidateSequences),
        },
    ]
}
