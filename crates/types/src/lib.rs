//! Shared type definitions for the NCBI Datasets MCP server.
//!
//! - [`schema`]: declarative per-operation argument schemas.
//! - [`validation`]: the argument validator driven by those schemas.
//! - [`request`]: upstream HTTP request descriptors produced by operation mappers.

pub mod request;
pub mod schema;
pub mod validation;

pub use request::{UpstreamMethod, UpstreamRequest};
pub use schema::{FieldKind, FieldSchema, OperationSchema, Precondition};
pub use validation::{ValidationError, ValidationReason, validate_arguments};
