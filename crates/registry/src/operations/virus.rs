use datasets_types::{FieldSchema, OperationSchema, UpstreamRequest};
use datasets_util::build_path;
use serde::Deserialize;
use serde_json::json;

use super::{OperationArgs, Paging, from_args, max_results_field, page_token_field};
use crate::catalog::OperationDescriptor;
use crate::envelope::EnvelopeShape;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchVirusGenomesArgs {
    pub taxon: String,
    pub host: Option<String>,
    pub complete_only: bool,
    pub released_since: Option<String>,
    #[serde(flatten)]
    pub paging: Paging,
}

impl SearchVirusGenomesArgs {
    pub fn request(&self) -> UpstreamRequest {
        let request = UpstreamRequest::get(build_path("/virus/taxon/{taxon}/dataset_report", &[("taxon", self.taxon.as_str())]))
            .query_opt("filter.host", self.host.as_deref())
            .query_flag("filter.complete_only", self.complete_only)
            .query_opt("filter.released_since", self.released_since.as_deref());
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetVirusInfoArgs {
    pub accession: String,
}

impl GetVirusInfoArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::get(build_path("/virus/accession/{accession}/dataset_report", &[("accession", self.accession.as_str())]))
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "search_virus_genomes",
            title: "Search virus genomes",
            description: "Search virus genomes by taxon with host, completeness and release-date filters.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("taxon", "Virus taxon name or id, e.g. `SARS-CoV-2`").required(),
                    FieldSchema::string("host", "Host organism name or id"),
                    FieldSchema::boolean("complete_only", "Only complete genomes").default_value(json!(false)),
                    FieldSchema::string("released_since", "Only genomes released on or after this date"),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::search("viruses"),
            parser: |arguments| from_args(arguments).map(OperationArgs::SearchVirusGenomes),
        },
        OperationDescriptor {
            name: "get_virus_info",
            title: "Get virus information",
            description: "Dataset report for a virus genome accession.",
            schema: OperationSchema {
                fields: vec![FieldSchema::string("accession", "Virus genome accession").required()],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("accession", &[]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetVirusInfo),
        },
    ]
}
