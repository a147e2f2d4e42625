use std::sync::Arc;

use datasets_api::Upstream;
use datasets_registry::{OperationDescriptor, OperationRegistry};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData as McpError, Implementation, ListResourceTemplatesResult, ListResourcesResult,
    ListToolsResult, PaginatedRequestParams, ProtocolVersion, ReadResourceRequestParams, ReadResourceResult, ServerCapabilities,
    ServerInfo, Tool, ToolAnnotations,
};
use rmcp::{RoleServer, ServerHandler, service::RequestContext};
use serde_json::Map;

use crate::server::dispatch::Dispatcher;
use crate::server::resources::{list_resource_templates, read_resource};

const SERVER_INSTRUCTIONS: &str = "Read-only access to the NCBI Datasets service.\n\
FLOW:\n\
1) Use a search_* tool to find accessions or ids (search_genomes, search_genes, search_taxonomy, search_assemblies).\n\
2) Pass an accession or id to a get_* tool for the full report.\n\
PAGINATION:\n\
- Search results carry next_page_token when more pages exist; pass it back unchanged as page_token.\n\
- max_results sets the page size (1-1000, default 50).\n\
ERRORS:\n\
- Failed calls return a result with error=true, a classification and the stage that failed.\n\
RESOURCES:\n\
- ncbi://genome/{accession}, ncbi://gene/{gene_id}, ncbi://taxonomy/{tax_id}, ncbi://assembly/{assembly_accession}, ncbi://search/{data_type}/{query}.";

#[derive(Clone)]
pub struct DatasetsMcpCore {
    dispatcher: Arc<Dispatcher>,
    tools: Arc<Vec<Tool>>,
}

impl DatasetsMcpCore {
    /// Create a handler serving the builtin operation table against `upstream`.
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        let dispatcher = Dispatcher::new(upstream);
        let tools = tools_for(dispatcher.registry());
        Self {
            dispatcher: Arc::new(dispatcher),
            tools: Arc::new(tools),
        }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Run a tool call. Failures come back as flagged results, never as protocol errors.
    pub async fn invoke_tool(&self, name: &str, arguments: Option<Map<String, serde_json::Value>>) -> CallToolResult {
        match self.dispatcher.dispatch(name, arguments.unwrap_or_default()).await {
            Ok(envelope) => CallToolResult::structured(envelope),
            Err(error) => CallToolResult::structured_error(error.to_envelope()),
        }
    }

    pub async fn read_datasets_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        read_resource(self.dispatcher.upstream(), uri).await
    }
}

fn tools_for(registry: &OperationRegistry) -> Vec<Tool> {
    registry.iter().map(tool_for).collect()
}

fn tool_for(descriptor: &OperationDescriptor) -> Tool {
    let mut tool = Tool::new(descriptor.name, descriptor.description, Arc::new(descriptor.schema.to_json_schema()));
    tool.title = Some(descriptor.title.to_string());
    let mut annotations = ToolAnnotations::with_title(descriptor.title);
    annotations.read_only_hint = Some(true);
    annotations.open_world_hint = Some(true);
    tool.annotations = Some(annotations);
    tool
}

impl ServerHandler for DatasetsMcpCore {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tools.to_vec())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { Ok(self.invoke_tool(&request.name, request.arguments).await) }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListResourcesResult::with_all_items(Vec::new())))
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(list_resource_templates()))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move { self.read_datasets_resource(&request.uri).await }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().enable_resources().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "ncbi-datasets".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("NCBI Datasets MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}
