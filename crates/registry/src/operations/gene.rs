//! Gene search, records, sequences, orthologs and batch lookup.

use datasets_types::{FieldSchema, OperationSchema, Precondition, UpstreamRequest};
use datasets_util::build_path;
use serde::Deserialize;
use serde_json::json;

use super::{
    IdentifierLookup, LookupTarget, OperationArgs, Paging, RequestPlan, from_args, max_results_field, page_token_field,
    tax_id_field, taxon_segment,
};
use crate::catalog::OperationDescriptor;
use crate::envelope::{ComparisonMode, EnvelopeShape};

const SEQUENCE_TYPES: &[&str] = &["genomic", "transcript", "protein"];
const MAX_ORTHOLOG_TAXA: usize = 50;
const MAX_BATCH_GENES: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchGenesArgs {
    pub query: String,
    pub organism: Option<String>,
    pub tax_id: Option<u64>,
    #[serde(flatten)]
    pub paging: Paging,
}

impl SearchGenesArgs {
    pub fn request(&self) -> UpstreamRequest {
        let taxon = taxon_segment(self.tax_id, self.organism.as_deref());
        let path = build_path(
            "/gene/symbol/{symbol}/taxon/{taxon}",
            &[("symbol", self.query.as_str()), ("taxon", taxon.as_str())],
        );
        self.paging.apply(UpstreamRequest::get(path))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetGeneInfoArgs {
    pub gene_id: Option<u64>,
    pub gene_symbol: Option<String>,
    pub organism: Option<String>,
}

impl GetGeneInfoArgs {
    /// By id directly, otherwise resolve the symbol within the organism first.
    pub fn plan(&self) -> RequestPlan {
        if let Some(gene_id) = self.gene_id {
            return RequestPlan::Direct(gene_record(&gene_id.to_string()));
        }
        let symbol = self.gene_symbol.as_deref().unwrap_or_default();
        let organism = self.organism.as_deref().unwrap_or_default();
        let lookup = UpstreamRequest::get(build_path(
            "/gene/symbol/{symbol}/taxon/{taxon}",
            &[("symbol", symbol), ("taxon", organism)],
        ));
        RequestPlan::Lookup(IdentifierLookup::new(
            lookup,
            LookupTarget::GeneId,
            format!("gene symbol `{symbol}` in organism `{organism}`"),
            gene_record,
        ))
    }
}

fn gene_record(gene_id: &str) -> UpstreamRequest {
    UpstreamRequest::get(build_path("/gene/id/{gene_id}", &[("gene_id", gene_id)]))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetGeneSequencesArgs {
    pub gene_id: u64,
    pub sequence_type: String,
}

impl GetGeneSequencesArgs {
    pub fn file_type(&self) -> &'static str {
        match self.sequence_type.as_str() {
            "transcript" => "FASTA_RNA",
            "protein" => "FASTA_PROTEIN",
            _ => "FASTA_GENE",
        }
    }

    pub fn request(&self) -> UpstreamRequest {
        let gene_id = self.gene_id.to_string();
        UpstreamRequest::get(build_path("/gene/id/{gene_id}/download_summary", &[("gene_id", gene_id.as_str())]))
            .query("include_annotation_type", self.file_type())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FindOrthologsArgs {
    pub gene_id: u64,
    #[serde(default)]
    pub taxon_filter: Vec<String>,
    #[serde(flatten)]
    pub paging: Paging,
}

impl FindOrthologsArgs {
    pub fn request(&self) -> UpstreamRequest {
        let gene_id = self.gene_id.to_string();
        let request = UpstreamRequest::get(build_path("/gene/id/{gene_id}/orthologs", &[("gene_id", gene_id.as_str())]))
            .query_list("taxon_filter", &self.taxon_filter);
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchGeneInfoArgs {
    pub gene_ids: Vec<u64>,
}

impl BatchGeneInfoArgs {
    pub fn request(&self) -> UpstreamRequest {
        UpstreamRequest::post("/gene", json!({ "gene_ids": self.gene_ids }))
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "search_genes",
            title: "Search genes",
            description: "Search genes by symbol or name within an organism.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("query", "Gene symbol or name, e.g. `BRCA1`").required(),
                    FieldSchema::string("organism", "Organism name"),
                    tax_id_field("NCBI taxonomy id of the organism"),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![Precondition::any_of(&[&["organism"], &["tax_id"]])],
            },
            envelope: EnvelopeShape::search("genes"),
            parser: |arguments| from_args(arguments).map(OperationArgs::SearchGenes),
        },
        OperationDescriptor {
            name: "get_gene_info",
            title: "Get gene information",
            description: "Gene record by NCBI gene id, or by symbol within an organism.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::integer("gene_id", "NCBI gene id").minimum(1.0),
                    FieldSchema::string("gene_symbol", "Gene symbol, e.g. `BRCA1`"),
                    FieldSchema::string("organism", "Organism name used to resolve the symbol"),
                ],
                preconditions: vec![Precondition::any_of(&[&["gene_id"], &["gene_symbol", "organism"]])],
            },
            envelope: EnvelopeShape::passthrough(),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetGeneInfo),
        },
        OperationDescriptor {
            name: "get_gene_sequences",
            title: "Get gene sequences",
            description: "Download summary for genomic, transcript or protein FASTA of a gene.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::integer("gene_id", "NCBI gene id").minimum(1.0).required(),
                    FieldSchema::string("sequence_type", "Kind of sequence")
                        .one_of(SEQUENCE_TYPES)
                        .default_value(json!("genomic")),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("gene_id", &["sequence_type"]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetGeneSequences),
        },
        OperationDescriptor {
            name: "find_orthologs",
            title: "Find orthologs",
            description: "Orthologous genes of a gene, optionally limited to some taxa.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::integer("gene_id", "NCBI gene id").minimum(1.0).required(),
                    FieldSchema::string_array("taxon_filter", "Restrict to these taxa (names or ids)")
                        .max_items(MAX_ORTHOLOG_TAXA),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::Comparison {
                inputs: &["gene_id", "taxon_filter"],
                mode: ComparisonMode::Fixed("orthologs"),
            },
            parser: |arguments| from_args(arguments).map(OperationArgs::FindOrthologs),
        },
        OperationDescriptor {
            name: "batch_gene_info",
            title: "Batch gene information",
            description: "Gene records for up to 100 gene ids in one request.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::integer_array("gene_ids", "NCBI gene ids")
                        .minimum(1.0)
                        .items(1, MAX_BATCH_GENES)
                        .required(),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::batch("genes", "gene_ids"),
            parser: |arguments| from_args(arguments).map(OperationArgs::BatchGeneInfo),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{plan_for, request_for};
    use crate::{LookupTarget, RequestPlan};
    use datasets_types::UpstreamMethod;
    use serde_json::json;

    #[test]
    fn gene_info_by_id_is_a_single_request() {
        let request = request_for("get_gene_info", json!({"gene_id": 672}));
        assert_eq!(request.path, "/gene/id/672");
    }

    #[test]
    fn gene_info_by_symbol_resolves_the_id_first() {
        let RequestPlan::Lookup(lookup) = plan_for("get_gene_info", json!({"gene_symbol": "BRCA1", "organism": "human"})) else {
            panic!("expected a lookup");
        };
        assert_eq!(lookup.request.path, "/gene/symbol/BRCA1/taxon/human");
        assert_eq!(lookup.target, LookupTarget::GeneId);

        let follow_up = lookup
            .resolve(&json!({"reports": [{"gene": {"gene_id": "672"}}]}))
            .expect("identifier");
        assert_eq!(follow_up.path, "/gene/id/672");
        assert_eq!(lookup.resolve(&json!({"reports": []})), None);
    }

    #[test]
    fn gene_sequences_map_sequence_type_to_file_type() {
        let request = request_for("get_gene_sequences", json!({"gene_id": 672}));
        assert_eq!(request.path, "/gene/id/672/download_summary");
        assert_eq!(request.query_value("include_annotation_type"), Some("FASTA_GENE"));

        let request = request_for("get_gene_sequences", json!({"gene_id": 672, "sequence_type": "protein"}));
        assert_eq!(request.query_value("include_annotation_type"), Some("FASTA_PROTEIN"));
    }

    #[test]
    fn orthologs_join_taxon_filter() {
        let request = request_for(
            "find_orthologs",
            json!({"gene_id": 672, "taxon_filter": ["mouse", "10116"], "page_token": "next"}),
        );
        assert_eq!(request.path, "/gene/id/672/orthologs");
        assert_eq!(request.query_value("taxon_filter"), Some("mouse,10116"));
        assert_eq!(request.query_value("page_token"), Some("next"));
    }

    #[test]
    fn batch_gene_info_posts_an_array() {
        let request = request_for("batch_gene_info", json!({"gene_ids": [672, 675]}));
        assert_eq!(request.method, UpstreamMethod::Post);
        assert_eq!(request.path, "/gene");
        assert_eq!(request.body, Some(json!({"gene_ids": [672, 675]})));
    }

    #[test]
    fn search_genes_uses_symbol_and_taxon_path() {
        let request = request_for("search_genes", json!({"query": "TP53", "tax_id": 9606}));
        assert_eq!(request.path, "/gene/symbol/TP53/taxon/9606");
    }
}
