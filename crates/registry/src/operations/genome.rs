//! Genome search, reports and download summaries.

use datasets_types::{FieldSchema, OperationSchema, Precondition, UpstreamRequest};
use datasets_util::build_path;
use serde::Deserialize;
use serde_json::json;

use super::{OperationArgs, Paging, from_args, max_results_field, page_token_field, tax_id_field, taxon_segment};
use crate::catalog::OperationDescriptor;
use crate::envelope::EnvelopeShape;

pub(crate) const ASSEMBLY_LEVELS: &[&str] = &["complete", "chromosome", "scaffold", "contig"];
const ASSEMBLY_SOURCES: &[&str] = &["refseq", "genbank", "all"];

/// Annotation file types requested when annotation is included.
pub(crate) const ANNOTATION_FILE_TYPES: &[&str] = &["GENOME_GFF", "GENOME_GBFF"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchGenomesArgs {
    pub tax_id: Option<u64>,
    pub organism: Option<String>,
    pub assembly_level: Option<String>,
    pub assembly_source: String,
    pub exclude_atypical: bool,
    #[serde(flatten)]
    pub paging: Paging,
}

impl SearchGenomesArgs {
    pub fn request(&self) -> UpstreamRequest {
        let taxon = taxon_segment(self.tax_id, self.organism.as_deref());
        let request = UpstreamRequest::get(build_path("/genome/taxon/{taxon}/dataset_report", &[("taxon", taxon.as_str())]))
            .query_opt("filters.assembly_level", self.assembly_level.as_deref())
            .query("filters.assembly_source", &self.assembly_source)
            .query_flag("filters.exclude_atypical", self.exclude_atypical);
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetGenomeInfoArgs {
    pub accession: String,
    pub include_annotation: bool,
}

impl GetGenomeInfoArgs {
    pub fn request(&self) -> UpstreamRequest {
        dataset_report_by_accession(&self.accession, self.include_annotation)
    }
}

/// Dataset report for one assembly accession, optionally with annotation files.
pub(crate) fn dataset_report_by_accession(accession: &str, include_annotation: bool) -> UpstreamRequest {
    let request = UpstreamRequest::get(build_path("/genome/accession/{accession}/dataset_report", &[("accession", accession)]));
    if include_annotation {
        request.query_list("include_annotation_type", ANNOTATION_FILE_TYPES)
    } else {
        request
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetGenomeSequenceReportsArgs {
    pub accession: String,
    #[serde(default)]
    pub chromosomes: Vec<String>,
    #[serde(flatten)]
    pub paging: Paging,
}

impl GetGenomeSequenceReportsArgs {
    pub fn request(&self) -> UpstreamRequest {
        let request = UpstreamRequest::get(build_path(
            "/genome/accession/{accession}/sequence_reports",
            &[("accession", self.accession.as_str())],
        ))
        .query_list("chromosomes", &self.chromosomes);
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadGenomeDataArgs {
    pub accession: String,
    pub include_sequence: bool,
    pub include_annotation: bool,
    pub include_protein: bool,
    pub include_cds: bool,
}

impl DownloadGenomeDataArgs {
    pub fn file_types(&self) -> Vec<&'static str> {
        let mut file_types = Vec::new();
        if self.include_sequence {
            file_types.push("GENOME_FASTA");
        }
        if self.include_annotation {
            file_types.extend_from_slice(ANNOTATION_FILE_TYPES);
        }
        if self.include_protein {
            file_types.push("PROT_FASTA");
        }
        if self.include_cds {
            file_types.push("CDS_FASTA");
        }
        file_types
    }

    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::get(build_path(
            "/genome/accession/{accession}/download_summary",
            &[("accession", self.accession.as_str())],
        ))
        .query_list("include_annotation_type", &self.file_types())
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "search_genomes",
            title: "Search genomes",
            description: "Search genome assemblies by organism name or NCBI taxonomy id.",
            schema: OperationSchema {
                fields: vec![
                    tax_id_field("NCBI taxonomy id of the organism"),
                    FieldSchema::string("organism", "Organism name, e.g. `Homo sapiens`"),
                    FieldSchema::string("assembly_level", "Minimum assembly level").one_of(ASSEMBLY_LEVELS),
                    FieldSchema::string("assembly_source", "Assembly source database")
                        .one_of(ASSEMBLY_SOURCES)
                        .default_value(json!("all")),
                    FieldSchema::boolean("exclude_atypical", "Exclude atypical assemblies").default_value(json!(false)),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![Precondition::any_of(&[&["organism"], &["tax_id"]])],
            },
            envelope: EnvelopeShape::search("genomes"),
            parser: |arguments| from_args(arguments).map(OperationArgs::SearchGenomes),
        },
        OperationDescriptor {
            name: "get_genome_info",
            title: "Get genome information",
            description: "Dataset report for a genome assembly accession.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("accession", "Genome assembly accession, e.g. `GCF_000001405.40`").required(),
                    FieldSchema::boolean("include_annotation", "Request GFF and GenBank annotation files")
                        .default_value(json!(true)),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("accession", &["include_annotation"]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetGenomeInfo),
        },
        OperationDescriptor {
            name: "get_genome_sequence_reports",
            title: "Get genome sequence reports",
            description: "Per-sequence (chromosome, scaffold) reports for a genome assembly.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("accession", "Genome assembly accession").required(),
                    FieldSchema::string_array("chromosomes", "Restrict to these chromosome names"),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("accession", &[]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetGenomeSequenceReports),
        },
        OperationDescriptor {
            name: "download_genome_data",
            title: "Download genome data",
            description: "Download summary (file types and sizes) for a genome assembly package.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("accession", "Genome assembly accession").required(),
                    FieldSchema::boolean("include_sequence", "Include genomic FASTA").default_value(json!(true)),
                    FieldSchema::boolean("include_annotation", "Include GFF and GenBank annotation").default_value(json!(true)),
                    FieldSchema::boolean("include_protein", "Include protein FASTA").default_value(json!(false)),
                    FieldSchema::boolean("include_cds", "Include CDS FASTA").default_value(json!(false)),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by(
                "accession",
                &["include_sequence", "include_annotation", "include_protein", "include_cds"],
            ),
            parser: |arguments| from_args(arguments).map(OperationArgs::DownloadGenomeData),
        },
    ]
}
