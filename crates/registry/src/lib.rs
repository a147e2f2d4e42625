//! Operation catalog for the NCBI Datasets tool server.
//!
//! This crate owns the fixed table of operations. Each [`OperationDescriptor`]
//! carries:
//!
//! - a declarative argument schema (validated by `datasets-types`)
//! - a parser from the validated bundle to a typed [`OperationArgs`] variant
//! - the pure request mapping on that variant ([`OperationArgs::plan`])
//! - the [`EnvelopeShape`] used to normalise the upstream response
//!
//! The table is built once ([`OperationRegistry::builtin`]) and looked up by
//! name at invocation time.

pub mod catalog;
pub mod envelope;
pub mod operations;

pub use catalog::{ArgumentParser, OperationDescriptor, OperationRegistry};
pub use envelope::{ComparisonMode, EnvelopeShape};
pub use operations::{IdentifierLookup, LookupTarget, OperationArgs, Paging, RequestPlan};
