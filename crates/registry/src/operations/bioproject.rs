use datasets_types::{FieldSchema, OperationSchema, UpstreamRequest};
use datasets_util::build_path;
use serde::Deserialize;

use super::{OperationArgs, Paging, from_args, max_results_field, page_token_field};
use crate::catalog::OperationDescriptor;
use crate::envelope::EnvelopeShape;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchByBioprojectArgs {
    pub bioproject_accession: String,
    #[serde(flatten)]
    pub paging: Paging,
}

impl SearchByBioprojectArgs {
    pub fn request(&self) -> UpstreamRequest {
        let request = UpstreamRequest::get(build_path(
            "/genome/bioproject/{accession}/dataset_report",
            &[("accession", self.bioproject_accession.as_str())],
        ));
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetBioprojectInfoArgs {
    pub bioproject_accession: String,
}

impl GetBioprojectInfoArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::get(build_path(
            "/bioproject/accession/{accession}/dataset_report",
            &[("accession", self.bioproject_accession.as_str())],
        ))
    }
}

fn bioproject_accession_field() -> FieldSchema {
    FieldSchema::string("bioproject_accession", "BioProject accession, e.g. `PRJNA164`").required()
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "search_by_bioproject",
            title: "Search by BioProject",
            description: "Genome assemblies registered under a BioProject.",
            schema: OperationSchema {
                fields: vec![bioproject_accession_field(), max_results_field(), page_token_field()],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::search("assemblies"),
            parser: |arguments| from_args(arguments).map(OperationArgs::SearchByBioproject),
        },
        OperationDescriptor {
            name: "get_bioproject_info",
            title: "Get BioProject information",
            description: "Dataset report for a BioProject accession.",
            schema: OperationSchema {
                fields: vec![bioproject_accession_field()],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("bioproject_accession", &[]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetBioprojectInfo),
        },
    ]
}
