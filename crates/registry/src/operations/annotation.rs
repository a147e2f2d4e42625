use datasets_types::{FieldSchema, OperationSchema, UpstreamRequest};
use datasets_util::build_path;
use serde::Deserialize;

use super::{OperationArgs, Paging, from_args, max_results_field, page_token_field};
use crate::catalog::OperationDescriptor;
use crate::envelope::EnvelopeShape;

const FEATURE_TYPES: &[&str] = &["protein_coding", "pseudogene", "tRNA", "rRNA", "ncRNA", "other"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchGenomeFeaturesArgs {
    pub accession: String,
    pub search_text: Option<String>,
    pub feature_type: Option<String>,
    pub chromosome: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
    #[serde(flatten)]
    pub paging: Paging,
}

impl SearchGenomeFeaturesArgs {
    /// `chr:start-end`, or the bare chromosome when no end is given.
    pub fn location(&self) -> Option<String> {
        let chromosome = self.chromosome.as_deref()?;
        Some(match self.end {
            Some(end) => format!("{chromosome}:{}-{end}", self.start.unwrap_or(1)),
            None => chromosome.to_string(),
        })
    }

    pub fn request(&self) -> UpstreamRequest {
        let request = UpstreamRequest::get(build_path(
            "/genome/accession/{accession}/annotation_report",
            &[("accession", self.accession.as_str())],
        ))
        .query_opt("search_text", self.search_text.as_deref())
        .query_opt("gene_types", self.feature_type.as_deref().map(str::to_ascii_uppercase))
        .query_opt("locations", self.location());
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetGenomeAnnotationArgs {
    pub accession: String,
}

impl GetGenomeAnnotationArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::get(build_path(
            "/genome/accession/{accession}/annotation_summary",
            &[("accession", self.accession.as_str())],
        ))
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "search_genome_features",
            title: "Search genome features",
            description: "Search annotated features of a genome by text, feature type or location.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("accession", "Genome assembly accession").required(),
                    FieldSchema::string("search_text", "Free text matched against gene names and descriptions"),
                    FieldSchema::string("feature_type", "Feature type").one_of(FEATURE_TYPES),
                    FieldSchema::string("chromosome", "Chromosome name"),
                    FieldSchema::integer("start", "Start position (1-based)").minimum(1.0),
                    FieldSchema::integer("end", "End position (1-based, inclusive)").minimum(1.0),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::search("features"),
            parser: |arguments| from_args(arguments).map(OperationArgs::SearchGenomeFeatures),
        },
        OperationDescriptor {
            name: "get_genome_annotation",
            title: "Get genome annotation",
            description: "Annotation summary for a genome assembly.",
            schema: OperationSchema {
                fields: vec![FieldSchema::string("accession", "Genome assembly accession").required()],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("accession", &[]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetGenomeAnnotation),
        },
    ]
}
