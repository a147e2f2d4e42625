use datasets_types::{OperationSchema, ValidationError, validate_arguments};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::envelope::EnvelopeShape;
use crate::operations::{
    OperationArgs, annotation, assembly, bioproject, comparative, gene, genome, protein, sequence, system, taxonomy, virus,
};

/// Converts a validated argument bundle into its typed variant.
pub type ArgumentParser = fn(Map<String, Value>) -> serde_json::Result<OperationArgs>;

/// One callable operation: name, argument schema, envelope shape and typed parser.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub schema: OperationSchema,
    pub envelope: EnvelopeShape,
    pub(crate) parser: ArgumentParser,
}

impl OperationDescriptor {
    /// Validate an untyped bundle, applying defaults.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        validate_arguments(&self.schema, arguments)
    }

    /// Turn a validated bundle into typed arguments.
    pub fn parse(&self, validated: Map<String, Value>) -> serde_json::Result<OperationArgs> {
        (self.parser)(validated)
    }
}

/// The fixed operation table, keyed by name in catalog order.
#[derive(Debug)]
pub struct OperationRegistry {
    operations: IndexMap<&'static str, OperationDescriptor>,
}

static BUILTIN: Lazy<OperationRegistry> = Lazy::new(|| {
    let descriptors = [
        genome::descriptors(),
        gene::descriptors(),
        taxonomy::descriptors(),
        assembly::descriptors(),
        virus::descriptors(),
        protein::descriptors(),
        annotation::descriptors(),
        bioproject::descriptors(),
        comparative::descriptors(),
        sequence::descriptors(),
        system::descriptors(),
    ];
    OperationRegistry::from_descriptors(descriptors.into_iter().flatten())
});

impl OperationRegistry {
    /// Process-wide catalog, built on first use and never mutated.
    pub fn builtin() -> &'static OperationRegistry {
        &BUILTIN
    }

    /// Build a registry; a later descriptor with a duplicate name is ignored.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = OperationDescriptor>) -> Self {
        let mut operations = IndexMap::new();
        for descriptor in descriptors {
            operations.entry(descriptor.name).or_insert(descriptor);
        }
        Self { operations }
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
