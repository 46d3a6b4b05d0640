//! Jira Admin MCP Server Library
//!
//! An MCP server exposing Jira Cloud and Jira Service Management
//! administration tools. Both REST surfaces share one HTTP client layer
//! with Basic auth, retry with exponential backoff on 429 and 5xx
//! responses, classified errors and normalised pagination.
//!
//! ## Features
//!
//! - **Two API surfaces**: Jira platform REST v3 and the Service Management API
//! - **Fail-fast startup**: credentials are checked before any tool is served
//! - **Uniform tool envelope**: every tool returns `success`/`data`/`pagination`/`error`
//! - **Read-only mode**: destructive tools are refused when `JIRA_READ_ONLY` is set

use crate::client::AtlassianClient;
use crate::config::JiraConfig;
use crate::error::{JiraMcpError, JiraMcpResult};
use crate::tools::{
    DeleteIssueParams, DeleteIssueTool, GetIssueParams, GetIssueTool, ListProjectsParams,
    ListProjectsTool, ListRequestTypesParams, ListRequestTypesTool, ListServiceDesksParams,
    ListServiceDesksTool, SearchIssuesParams, SearchIssuesTool, ToolResult,
};

use chrono::{DateTime, Utc};
use pulseengine_mcp_macros::{mcp_server, mcp_tools};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

pub mod client;
pub mod config;
pub mod error;
pub mod tools;
pub mod validation;

/// Number of tools registered in the `#[mcp_tools]` block
const TOOLS_COUNT: usize = 8;

/// Server status information
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JiraServerStatus {
    pub server_name: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub instance_url: String,
    pub read_only: bool,
    pub platform_connected: bool,
    pub service_management_connected: bool,
    pub authenticated_user: Option<String>,
    pub tools_count: usize,
}

/// Jira Admin MCP Server
///
/// Holds one connected client per API surface and the tool implementations
/// built on top of them.
#[mcp_server(
    name = "Jira Admin MCP Server",
    version = "0.1.0",
    description = "Jira Cloud and Jira Service Management administration tools",
    auth = "disabled"
)]
#[derive(Debug, Clone)]
pub struct JiraAdminMcpServer {
    /// Server start time for uptime calculation
    start_time: Instant,

    /// Wall-clock start time reported in the status
    started_at: DateTime<Utc>,

    config: Arc<JiraConfig>,

    /// Jira platform REST API v3 client
    platform: Arc<AtlassianClient>,

    /// Jira Service Management REST API client
    service_management: Arc<AtlassianClient>,

    /// Display name returned by the startup credential check
    authenticated_user: Option<String>,

    get_issue_tool: Arc<GetIssueTool>,
    search_issues_tool: Arc<SearchIssuesTool>,
    delete_issue_tool: Arc<DeleteIssueTool>,
    list_projects_tool: Arc<ListProjectsTool>,
    list_service_desks_tool: Arc<ListServiceDesksTool>,
    list_request_types_tool: Arc<ListRequestTypesTool>,
}

impl Default for JiraAdminMcpServer {
    fn default() -> Self {
        // The server needs validated credentials and live connections
        panic!(
            "JiraAdminMcpServer cannot be created with default(). \
             Use JiraAdminMcpServer::new() instead."
        )
    }
}

impl JiraAdminMcpServer {
    /// Load configuration from the environment and start the server
    #[instrument]
    pub async fn new() -> JiraMcpResult<Self> {
        info!("Initializing Jira Admin MCP Server");

        let config =
            JiraConfig::load().map_err(|e| JiraMcpError::config(format!("{:#}", e)))?;
        info!("Configuration loaded successfully");

        Self::with_config(config).await
    }

    /// Start the server with an explicit configuration.
    ///
    /// Connects the platform client, checks the credentials against
    /// `/rest/api/3/myself` and only then connects the service management
    /// client. Any failure aborts startup.
    #[instrument(skip(config))]
    pub async fn with_config(config: JiraConfig) -> JiraMcpResult<Self> {
        let config = Arc::new(
            config
                .validated()
                .map_err(|e| JiraMcpError::config(format!("{:#}", e)))?,
        );

        let platform = Arc::new(AtlassianClient::platform(&config));
        platform.connect().await?;

        let user = match platform.validate_credentials().await {
            Ok(user) => user,
            Err(e) => {
                error!("Credential validation failed: {}", e);
                platform.disconnect().await;
                return Err(e.into());
            }
        };
        let authenticated_user = user
            .get("displayName")
            .and_then(Value::as_str)
            .map(str::to_string);
        info!(
            "Authenticated as {}",
            authenticated_user.as_deref().unwrap_or("unknown user")
        );

        let service_management = Arc::new(AtlassianClient::service_management(&config));
        if let Err(e) = service_management.connect().await {
            platform.disconnect().await;
            return Err(e.into());
        }

        if config.read_only {
            info!("Read-only mode enabled; destructive tools are disabled");
        }

        info!("Jira Admin MCP Server initialized successfully");

        Ok(Self {
            start_time: Instant::now(),
            started_at: Utc::now(),
            get_issue_tool: Arc::new(GetIssueTool::new(Arc::clone(&platform))),
            search_issues_tool: Arc::new(SearchIssuesTool::new(
                Arc::clone(&platform),
                Arc::clone(&config),
            )),
            delete_issue_tool: Arc::new(DeleteIssueTool::new(
                Arc::clone(&platform),
                Arc::clone(&config),
            )),
            list_projects_tool: Arc::new(ListProjectsTool::new(
                Arc::clone(&platform),
                Arc::clone(&config),
            )),
            list_service_desks_tool: Arc::new(ListServiceDesksTool::new(
                Arc::clone(&service_management),
                Arc::clone(&config),
            )),
            list_request_types_tool: Arc::new(ListRequestTypesTool::new(
                Arc::clone(&service_management),
                Arc::clone(&config),
            )),
            config,
            platform,
            service_management,
            authenticated_user,
        })
    }

    /// Get server uptime in seconds
    fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// All public methods in this impl block become MCP tools
#[mcp_tools]
impl JiraAdminMcpServer {
    /// Test the Jira connection and credentials
    ///
    /// Calls `/rest/api/3/myself` and returns the authenticated account.
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> anyhow::Result<ToolResult> {
        info!("Testing Jira connection");

        let result = match self.platform.validate_credentials().await {
            Ok(user) => ToolResult::ok(json!({
                "connected": true,
                "instance_url": self.config.instance_url,
                "account_id": user.get("accountId").cloned().unwrap_or(Value::Null),
                "display_name": user.get("displayName").cloned().unwrap_or(Value::Null),
                "email_address": user.get("emailAddress").cloned().unwrap_or(Value::Null),
            })),
            Err(e) => {
                error!("Connection test failed: {}", e);
                ToolResult::from_error("test_connection", &JiraMcpError::from(e))
            }
        };
        Ok(result)
    }

    /// Get server status and connection information
    #[instrument(skip(self))]
    pub async fn get_server_status(&self) -> anyhow::Result<JiraServerStatus> {
        Ok(JiraServerStatus {
            server_name: "Jira Admin MCP Server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: self.started_at,
            uptime_seconds: self.get_uptime_seconds(),
            instance_url: self.config.instance_url.clone(),
            read_only: self.config.read_only,
            platform_connected: self.platform.is_connected().await,
            service_management_connected: self.service_management.is_connected().await,
            authenticated_user: self.authenticated_user.clone(),
            tools_count: TOOLS_COUNT,
        })
    }

    /// Get a Jira issue by key
    ///
    /// # Examples
    /// - Basic issue: `{"issue_key": "PROJ-123"}`
    /// - Selected fields with changelog:
    ///   `{"issue_key": "PROJ-123", "fields": ["summary", "status"], "expand": ["changelog"]}`
    #[instrument(skip(self))]
    pub async fn get_issue(&self, params: GetIssueParams) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::from_outcome(
            "get_issue",
            self.get_issue_tool.execute(params).await,
        ))
    }

    /// Search issues with JQL
    ///
    /// Results are token paginated: pass `next_page_token` from the previous
    /// response's pagination block to fetch the next page.
    ///
    /// # Examples
    /// - `{"jql": "project = PROJ AND status = \"In Progress\"", "limit": 20}`
    #[instrument(skip(self))]
    pub async fn search_issues(&self, params: SearchIssuesParams) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::from_outcome(
            "search_issues",
            self.search_issues_tool.execute(params).await,
        ))
    }

    /// Delete a Jira issue
    ///
    /// Refused with `PERMISSION_ERROR` when the server runs in read-only mode.
    #[instrument(skip(self))]
    pub async fn delete_issue(&self, params: DeleteIssueParams) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::from_outcome(
            "delete_issue",
            self.delete_issue_tool.execute(params).await,
        ))
    }

    /// List Jira projects, optionally filtered by name/key or project type
    #[instrument(skip(self))]
    pub async fn list_projects(&self, params: ListProjectsParams) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::from_outcome(
            "list_projects",
            self.list_projects_tool.execute(params).await,
        ))
    }

    /// List Jira Service Management service desks
    #[instrument(skip(self))]
    pub async fn list_service_desks(
        &self,
        params: ListServiceDesksParams,
    ) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::from_outcome(
            "list_service_desks",
            self.list_service_desks_tool.execute(params).await,
        ))
    }

    /// List the request types of a service desk
    ///
    /// # Examples
    /// - `{"service_desk_id": "1", "search_query": "access"}`
    #[instrument(skip(self))]
    pub async fn list_request_types(
        &self,
        params: ListRequestTypesParams,
    ) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::from_outcome(
            "list_request_types",
            self.list_request_types_tool.execute(params).await,
        ))
    }
}

impl JiraAdminMcpServer {
    /// Release both connections, service management first
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        info!("Shutting down Jira Admin MCP Server");
        self.service_management.disconnect().await;
        self.platform.disconnect().await;
    }
}
