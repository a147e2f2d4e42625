use datasets_types::{FieldSchema, OperationSchema, Precondition, UpstreamRequest};
use datasets_util::build_path;
use serde::Deserialize;

use super::{OperationArgs, Paging, from_args, max_results_field, page_token_field, tax_id_field, taxon_segment};
use crate::catalog::OperationDescriptor;
use crate::envelope::EnvelopeShape;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchProteinsArgs {
    pub query: String,
    pub organism: Option<String>,
    pub tax_id: Option<u64>,
    #[serde(flatten)]
    pub paging: Paging,
}

impl SearchProteinsArgs {
    /// Proteins are found through the product report of the matching gene.
    pub fn request(&self) -> UpstreamRequest {
        let taxon = taxon_segment(self.tax_id, self.organism.as_deref());
        let path = build_path(
            "/gene/symbol/{symbol}/taxon/{taxon}/product_report",
            &[("symbol", self.query.as_str()), ("taxon", taxon.as_str())],
        );
        self.paging.apply(UpstreamRequest::get(path))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetProteinInfoArgs {
    pub accession: String,
}

impl GetProteinInfoArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::get(build_path(
            "/protein/accession/{accession}/dataset_report",
            &[("accession", self.accession.as_str())],
        ))
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "search_proteins",
            title: "Search proteins",
            description: "Protein products of genes matching a symbol within an organism.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("query", "Gene symbol or protein name").required(),
                    FieldSchema::string("organism", "Organism name"),
                    tax_id_field("NCBI taxonomy id of the organism"),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![Precondition::any_of(&[&["organism"], &["tax_id"]])],
            },
            envelope: EnvelopeShape::search("proteins"),
            parser: |arguments| from_args(arguments).map(OperationArgs::SearchProteins),
        },
        OperationDescriptor {
            name: "get_protein_info",
            title: "Get protein information",
            description: "Dataset report for a protein accession.",
            schema: OperationSchema {
                fields: vec![FieldSchema::string("accession", "Protein accession, e.g. `NP_000483.3`").required()],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("accession", &[]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetProteinInfo),
        },
    ]
}
