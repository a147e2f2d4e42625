//! Typed operation arguments and their upstream request mapping.
//!
//! Each submodule owns one family of operations: the descriptors it
//! contributes to the catalog, a `Deserialize` struct per operation built from
//! the validated argument bundle, and the pure mapping from that struct to an
//! [`UpstreamRequest`] (or a two-step [`RequestPlan::Lookup`]).

use datasets_types::{FieldSchema, UpstreamRequest};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

pub mod annotation;
pub mod assembly;
pub mod bioproject;
pub mod comparative;
pub mod gene;
pub mod genome;
pub mod protein;
pub mod sequence;
pub mod system;
pub mod taxonomy;
pub mod virus;

use annotation::{GetGenomeAnnotationArgs, SearchGenomeFeaturesArgs};
use assembly::{BatchAssemblyInfoArgs, GetAssemblyInfoArgs, GetAssemblyQualityArgs, GetAssemblyReportsArgs, SearchAssembliesArgs};
use bioproject::{GetBioprojectInfoArgs, SearchByBioprojectArgs};
use comparative::CompareGenomesArgs;
use gene::{BatchGeneInfoArgs, FindOrthologsArgs, GetGeneInfoArgs, GetGeneSequencesArgs, SearchGenesArgs};
use genome::{DownloadGenomeDataArgs, GetGenomeInfoArgs, GetGenomeSequenceReportsArgs, SearchGenomesArgs};
use protein::{GetProteinInfoArgs, SearchProteinsArgs};
use sequence::{BlastSearchArgs, ValidateSequencesArgs};
use system::GetDatabaseStatsArgs;
use taxonomy::{
    GetOrganismInfoArgs, GetPhylogeneticTreeArgs, GetTaxonomicLineageArgs, GetTaxonomyInfoArgs, SearchTaxonomyArgs,
};
use virus::{GetVirusInfoArgs, SearchVirusGenomesArgs};

/// Validated arguments for one invocation, one variant per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationArgs {
    SearchGenomes(SearchGenomesArgs),
    GetGenomeInfo(GetGenomeInfoArgs),
    GetGenomeSequenceReports(GetGenomeSequenceReportsArgs),
    DownloadGenomeData(DownloadGenomeDataArgs),
    SearchGenes(SearchGenesArgs),
    GetGeneInfo(GetGeneInfoArgs),
    GetGeneSequences(GetGeneSequencesArgs),
    FindOrthologs(FindOrthologsArgs),
    BatchGeneInfo(BatchGeneInfoArgs),
    SearchTaxonomy(SearchTaxonomyArgs),
    GetTaxonomyInfo(GetTaxonomyInfoArgs),
    GetOrganismInfo(GetOrganismInfoArgs),
    GetTaxonomicLineage(GetTaxonomicLineageArgs),
    GetPhylogeneticTree(GetPhylogeneticTreeArgs),
    SearchAssemblies(SearchAssembliesArgs),
    GetAssemblyInfo(GetAssemblyInfoArgs),
    GetAssemblyReports(GetAssemblyReportsArgs),
    BatchAssemblyInfo(BatchAssemblyInfoArgs),
    GetAssemblyQuality(GetAssemblyQualityArgs),
    SearchVirusGenomes(SearchVirusGenomesArgs),
    GetVirusInfo(GetVirusInfoArgs),
    SearchProteins(SearchProteinsArgs),
    GetProteinInfo(GetProteinInfoArgs),
    SearchGenomeFeatures(SearchGenomeFeaturesArgs),
    GetGenomeAnnotation(GetGenomeAnnotationArgs),
    SearchByBioproject(SearchByBioprojectArgs),
    GetBioprojectInfo(GetBioprojectInfoArgs),
    CompareGenomes(CompareGenomesArgs),
    BlastSearch(BlastSearchArgs),
    ValidateSequences(ValidateSequencesArgs),
    GetDatabaseStats(GetDatabaseStatsArgs),
}

impl OperationArgs {
    /// Build the upstream request plan for these arguments. Pure.
    pub fn plan(&self) -> RequestPlan {
        use OperationArgs::*;
        let request = match self {
            GetGeneInfo(args) => return args.plan(),
            GetOrganismInfo(args) => return args.plan(),
            SearchGenomes(args) => args.request(),
            GetGenomeInfo(args) => args.request(),
            GetGenomeSequenceReports(args) => args.request(),
            DownloadGenomeData(args) => args.request(),
            SearchGenes(args) => args.request(),
            GetGeneSequences(args) => args.request(),
            FindOrthologs(args) => args.request(),
            BatchGeneInfo(args) => args.request(),
            SearchTaxonomy(args) => args.request(),
            GetTaxonomyInfo(args) => args.request(),
            GetTaxonomicLineage(args) => args.request(),
            GetPhylogeneticTree(args) => args.request(),
            SearchAssemblies(args) => args.request(),
            GetAssemblyInfo(args) => args.request(),
            GetAssemblyReports(args) => args.request(),
            BatchAssemblyInfo(args) => args.request(),
            GetAssemblyQuality(args) => args.request(),
            SearchVirusGenomes(args) => args.request(),
            GetVirusInfo(args) => args.request(),
            SearchProteins(args) => args.request(),
            GetProteinInfo(args) => args.request(),
            SearchGenomeFeatures(args) => args.request(),
            GetGenomeAnnotation(args) => args.request(),
            SearchByBioproject(args) => args.request(),
            GetBioprojectInfo(args) => args.request(),
            CompareGenomes(args) => args.request(),
            BlastSearch(args) => args.request(),
            ValidateSequences(args) => args.request(),
            GetDatabaseStats(args) => args.request(),
        };
        RequestPlan::Direct(request)
    }
}

/// How an invocation reaches the upstream service.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPlan {
    /// A single request.
    Direct(UpstreamRequest),
    /// Resolve an identifier first, then issue the primary request with it.
    Lookup(IdentifierLookup),
}

/// First half of a two-step request.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierLookup {
    pub request: UpstreamRequest,
    pub target: LookupTarget,
    /// What was looked up, for "not found" messages.
    pub subject: String,
    then: fn(&str) -> UpstreamRequest,
}

impl IdentifierLookup {
    pub(crate) fn new(request: UpstreamRequest, target: LookupTarget, subject: String, then: fn(&str) -> UpstreamRequest) -> Self {
        Self {
            request,
            target,
            subject,
            then,
        }
    }

    /// Build the primary request from the lookup response, or `None` when the
    /// lookup produced no identifier.
    pub fn resolve(&self, payload: &Value) -> Option<UpstreamRequest> {
        self.target.extract(payload).map(|identifier| (self.then)(&identifier))
    }
}

/// Identifier extracted from a lookup response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget {
    /// `reports[0].gene.gene_id` of a gene symbol search.
    GeneId,
    /// `sci_name_and_ids[0].tax_id` of a taxon name suggestion.
    TaxId,
}

impl LookupTarget {
    pub fn extract(&self, payload: &Value) -> Option<String> {
        let candidate = match self {
            LookupTarget::GeneId => payload.pointer("/reports/0/gene/gene_id"),
            LookupTarget::TaxId => payload.pointer("/sci_name_and_ids/0/tax_id"),
        }?;
        match candidate {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LookupTarget::GeneId => "gene id",
            LookupTarget::TaxId => "taxonomy id",
        }
    }
}

/// Page size and continuation token shared by list operations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Paging {
    pub max_results: u32,
    pub page_token: Option<String>,
}

impl Paging {
    /// Forward `page_size` and, unmodified, `page_token`.
    pub fn apply(&self, request: UpstreamRequest) -> UpstreamRequest {
        request
            .query("page_size", self.max_results)
            .query_opt("page_token", self.page_token.as_deref())
    }
}

pub(crate) const DEFAULT_PAGE_SIZE: u64 = 50;
pub(crate) const MAX_PAGE_SIZE: f64 = 1000.0;

pub(crate) fn max_results_field() -> FieldSchema {
    FieldSchema::integer("max_results", "Maximum number of results per page")
        .range(1.0, MAX_PAGE_SIZE)
        .default_value(json!(DEFAULT_PAGE_SIZE))
}

pub(crate) fn page_token_field() -> FieldSchema {
    FieldSchema::string("page_token", "Continuation token returned by a previous page")
}

pub(crate) fn tax_id_field(description: &'static str) -> FieldSchema {
    FieldSchema::integer("tax_id", description).minimum(1.0)
}

/// Path segment naming a taxon: the numeric id when given, else the name.
pub(crate) fn taxon_segment(tax_id: Option<u64>, organism: Option<&str>) -> String {
    match (tax_id, organism) {
        (Some(tax_id), _) => tax_id.to_string(),
        (None, Some(organism)) => organism.to_string(),
        (None, None) => String::new(),
    }
}

pub(crate) fn upper_case(values: &[String]) -> Vec<String> {
    values.iter().map(|value| value.to_ascii_uppercase()).collect()
}

pub(crate) fn from_args<T: DeserializeOwned>(arguments: Map<String, Value>) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(arguments))
}
