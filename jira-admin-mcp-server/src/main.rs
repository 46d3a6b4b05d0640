//! Jira Admin MCP Server - Jira Cloud and Service Management tools via MCP
//!
//! Reads its configuration from the environment (or a TOML file), checks
//! the credentials against the Jira instance and serves tools over STDIO.

use jira_admin_mcp_server::JiraAdminMcpServer;
use pulseengine_mcp_server::McpServerBuilder;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configure logging for STDIO transport
    JiraAdminMcpServer::configure_stdio_logging();

    info!("Starting Jira Admin MCP Server...");

    let jira_server = match JiraAdminMcpServer::new().await {
        Ok(server) => {
            info!("Jira Admin MCP Server created successfully");
            server
        }
        Err(e) => {
            error!("Failed to create Jira Admin MCP Server: {}", e);
            eprintln!("❌ Failed to start Jira Admin MCP Server: {}", e);
            eprintln!("\nPlease check:");
            eprintln!("  - JIRA_INSTANCE_URL is set, e.g. https://your-site.atlassian.net");
            eprintln!("  - JIRA_USER_EMAIL and JIRA_API_TOKEN are set and valid");
            eprintln!("  - The Jira instance is reachable from this machine");
            std::process::exit(1);
        }
    };

    info!("Starting MCP server with STDIO transport...");

    let lifecycle = jira_server.clone();
    let mut server = jira_server.serve_stdio().await?;

    info!("🚀 Jira Admin MCP Server is running and ready to serve requests");

    let outcome = server.run().await;
    lifecycle.shutdown().await;
    outcome?;

    Ok(())
}
