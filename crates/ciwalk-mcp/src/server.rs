//! MCP server implementation.
//!
//! This module contains the main server setup using rmcp.

use crate::error::Error;
use crate::models::TraverseParams;
use crate::tools::Tools;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{
    ErrorData as McpError, ServiceExt, handler::server::ServerHandler, tool, tool_handler,
    tool_router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The ciwalk MCP server.
///
/// Provides MCP protocol handling over stdio transport.
#[derive(Clone)]
pub struct CiwalkMcpServer {
    /// Tool implementations.
    tools: Arc<Tools>,
    /// Tool router for MCP dispatch.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CiwalkMcpServer {
    /// Walk the dependency graph of a configuration item.
    #[tool(
        description = "Walk the relationship graph of a configuration item (CI). Give exactly one of root_id or root_name. Returns the root, the relationships found (each with direction relative to the CI it was found from, and the depth it was found at) and a summary. Use direction=downstream for what the CI depends on and upstream for what depends on it."
    )]
    async fn traverse_dependencies(
        &self,
        Parameters(params): Parameters<TraverseParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.traverse(params, context.ct).await
    }

    /// Show the record source the server reads from.
    #[tool(description = "Show which instance or fixture the server reads CIs from, and the tables used.")]
    async fn connection_info(&self) -> Result<CallToolResult, McpError> {
        let response = self.tools.connection_info();
        Ok(CallToolResult::success(vec![Content::json(response)?]))
    }
}

impl CiwalkMcpServer {
    /// Create a new ciwalk MCP server.
    #[must_use]
    pub fn new(tools: Tools) -> Self {
        Self {
            tools: Arc::new(tools),
            tool_router: Self::tool_router(),
        }
    }

    /// Run a traversal that stops when `cancel` fires.
    async fn traverse(
        &self,
        params: TraverseParams,
        cancel: CancellationToken,
    ) -> Result<CallToolResult, McpError> {
        match self.tools.traverse_dependencies(params, cancel).await {
            Ok(result) => Ok(CallToolResult::success(vec![Content::json(result)?])),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a reference to the tools.
    #[must_use]
    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    /// Serve MCP over stdio until the client disconnects.
    ///
    /// # Errors
    ///
    /// Returns `Error::Mcp` if initialization fails or the service task
    /// aborts.
    pub async fn run(self) -> crate::Result<()> {
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| Error::Mcp(e.to_string()))?;
        let reason = service
            .waiting()
            .await
            .map_err(|e| Error::Mcp(e.to_string()))?;
        tracing::info!(?reason, "MCP session ended");
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for CiwalkMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ciwalk-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Ciwalk MCP server for configuration-item impact analysis. Use traverse_dependencies to find what a CI depends on or what depends on it."
                    .into(),
            ),
        }
    }
}
