//! Taxonomy search, records, lineage and subtrees.

use datasets_types::{FieldSchema, OperationSchema, Precondition, UpstreamRequest};
use datasets_util::build_path;
use serde::Deserialize;
use serde_json::json;

use super::{
    IdentifierLookup, LookupTarget, OperationArgs, Paging, RequestPlan, from_args, max_results_field, page_token_field,
    tax_id_field, upper_case,
};
use crate::catalog::OperationDescriptor;
use crate::envelope::{ComparisonMode, EnvelopeShape};

const RANKS: &[&str] = &[
    "superkingdom",
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "genus",
    "species",
    "subspecies",
];
const RANK_LIMITS: &[&str] = &["species", "genus", "family", "order", "class", "phylum"];
const MIN_TREE_TAXA: usize = 2;
const MAX_TREE_TAXA: usize = 50;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchTaxonomyArgs {
    pub query: String,
    pub rank: Option<String>,
    pub exact_match: bool,
    #[serde(flatten)]
    pub paging: Paging,
}

impl SearchTaxonomyArgs {
    pub fn request(&self) -> UpstreamRequest {
        let request = UpstreamRequest::get(build_path("/taxonomy/taxon_suggest/{query}", &[("query", self.query.as_str())]))
            .query_opt("tax_rank_filter", self.rank.as_deref().map(str::to_ascii_uppercase))
            .query_flag("exact_match", self.exact_match);
        self.paging.apply(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetTaxonomyInfoArgs {
    pub tax_id: u64,
}

impl GetTaxonomyInfoArgs {
    pub fn request(&self) -> UpstreamRequest {
        taxon_report(&self.tax_id.to_string())
    }
}

fn taxon_report(tax_id: &str) -> UpstreamRequest {
    UpstreamRequest::get(build_path("/taxonomy/taxon/{tax_id}/dataset_report", &[("tax_id", tax_id)]))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetOrganismInfoArgs {
    pub organism: Option<String>,
    pub tax_id: Option<u64>,
}

impl GetOrganismInfoArgs {
    /// By taxonomy id directly, otherwise resolve the name first.
    pub fn plan(&self) -> RequestPlan {
        if let Some(tax_id) = self.tax_id {
            return RequestPlan::Direct(taxon_report(&tax_id.to_string()));
        }
        let organism = self.organism.as_deref().unwrap_or_default();
        let lookup = UpstreamRequest::get(build_path("/taxonomy/taxon_suggest/{query}", &[("query", organism)]));
        RequestPlan::Lookup(IdentifierLookup::new(
            lookup,
            LookupTarget::TaxId,
            format!("organism `{organism}`"),
            taxon_report,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetTaxonomicLineageArgs {
    pub tax_id: u64,
    #[serde(default)]
    pub ranks: Vec<String>,
}

impl GetTaxonomicLineageArgs {
    pub fn request(&self) -> UpstreamRequest {
        let tax_id = self.tax_id.to_string();
        UpstreamRequest::get(build_path("/taxonomy/taxon/{tax_id}/related_ids", &[("tax_id", tax_id.as_str())]))
            .query("include_lineage", true)
            .query_list("ranks", &upper_case(&self.ranks))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetPhylogeneticTreeArgs {
    pub tax_ids: Vec<u64>,
    pub rank_limit: Option<String>,
}

impl GetPhylogeneticTreeArgs {
    pub fn request(&self) -> UpstreamRequest {
        let joined = self.tax_ids.iter().map(u64::to_string).collect::<Vec<String>>().join(",");
        UpstreamRequest::get(build_path("/taxonomy/taxon/{tax_ids}/filtered_subtree", &[("tax_ids", joined.as_str())]))
            .query_opt("rank_limits", self.rank_limit.as_deref().map(str::to_ascii_uppercase))
    }
}

pub(crate) fn descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "search_taxonomy",
            title: "Search taxonomy",
            description: "Suggest taxa whose names match a query, optionally restricted to a rank.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("query", "Taxon name or prefix").required(),
                    FieldSchema::string("rank", "Restrict to this rank").one_of(RANKS),
                    FieldSchema::boolean("exact_match", "Only exact name matches").default_value(json!(false)),
                    max_results_field(),
                    page_token_field(),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::Search {
                key: "taxa",
                upstream_key: "sci_name_and_ids",
            },
            parser: |arguments| from_args(arguments).map(OperationArgs::SearchTaxonomy),
        },
        OperationDescriptor {
            name: "get_taxonomy_info",
            title: "Get taxonomy information",
            description: "Taxonomy dataset report for an NCBI taxonomy id.",
            schema: OperationSchema {
                fields: vec![tax_id_field("NCBI taxonomy id").required()],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("tax_id", &[]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetTaxonomyInfo),
        },
        OperationDescriptor {
            name: "get_organism_info",
            title: "Get organism information",
            description: "Taxonomy report for an organism given by name or taxonomy id.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::string("organism", "Organism name, e.g. `Mus musculus`"),
                    tax_id_field("NCBI taxonomy id"),
                ],
                preconditions: vec![Precondition::any_of(&[&["organism"], &["tax_id"]])],
            },
            envelope: EnvelopeShape::passthrough(),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetOrganismInfo),
        },
        OperationDescriptor {
            name: "get_taxonomic_lineage",
            title: "Get taxonomic lineage",
            description: "Lineage of a taxon, optionally limited to some ranks.",
            schema: OperationSchema {
                fields: vec![
                    tax_id_field("NCBI taxonomy id").required(),
                    FieldSchema::string_array("ranks", "Only report these ranks").one_of(RANKS),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::fetch_by("tax_id", &[]),
            parser: |arguments| from_args(arguments).map(OperationArgs::GetTaxonomicLineage),
        },
        OperationDescriptor {
            name: "get_phylogenetic_tree",
            title: "Get phylogenetic tree",
            description: "Taxonomic subtree spanning 2 to 50 taxa.",
            schema: OperationSchema {
                fields: vec![
                    FieldSchema::integer_array("tax_ids", "NCBI taxonomy ids")
                        .minimum(1.0)
                        .items(MIN_TREE_TAXA, MAX_TREE_TAXA)
                        .required(),
                    FieldSchema::string("rank_limit", "Deepest rank to include").one_of(RANK_LIMITS),
                ],
                preconditions: vec![],
            },
            envelope: EnvelopeShape::Comparison {
                inputs: &["tax_ids"],
                mode: ComparisonMode::Fixed("phylogenetic_tree"),
            },
            parser: |arguments| from_args(arguments).map(OperationArgs::GetPhylogeneticTree),
        },
    ]
}
