//! MCP server surface: tool dispatch, `ncbi://` resources and stdio serving.

mod core;
mod dispatch;
mod errors;
mod resources;
mod stdio;
#[cfg(test)]
mod testing;

pub use self::core::DatasetsMcpCore;
pub use dispatch::{DispatchError, DispatchStage, Dispatcher, ErrorClassification};
pub use resources::{ResourceTarget, list_resource_templates, read_resource};
pub use stdio::serve_stdio;
