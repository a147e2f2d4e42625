use anyhow::{Context, Result};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing::info;

use crate::server::core::DatasetsMcpCore;

/// Serve `core` over stdin/stdout until the client disconnects or Ctrl-C.
pub async fn serve_stdio(core: DatasetsMcpCore) -> Result<()> {
    let tool_count = core.tools().len();
    let running = core.serve(stdio()).await.context("failed to start stdio transport")?;
    info!(tools = tool_count, "MCP server listening on stdio");

    let cancellation = running.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            cancellation.cancel();
        }
    });

    let reason = running.waiting().await.context("MCP service task failed")?;
    info!(?reason, "MCP server stopped");
    Ok(())
}
