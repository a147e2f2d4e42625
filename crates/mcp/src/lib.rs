//! Model Context Protocol surface for the NCBI Datasets tools.
//!
//! [`DatasetsMcpCore`] publishes one tool per operation in the builtin
//! catalog plus the `ncbi://` resource templates, and routes calls through the
//! [`Dispatcher`]. [`serve_stdio`] runs it over stdin/stdout.

pub mod server;

pub use server::{DatasetsMcpCore, DispatchError, DispatchStage, Dispatcher, ErrorClassification, ResourceTarget, serve_stdio};
