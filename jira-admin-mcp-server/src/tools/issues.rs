//! Issue tools: fetch, search and delete Jira issues
//!
//! All three talk to the platform REST API. Search uses the token-paginated
//! `search/jql` endpoint, so its pagination block carries a
//! `next_page_token` instead of offsets.

use crate::client::{AtlassianClient, QueryParams};
use crate::config::{JiraConfig, MAX_PAGE_SIZE_CEILING};
use crate::error::{ErrorCategory, JiraMcpResult};
use crate::tools::ToolResult;
use crate::validation::{validate_integer, validate_issue_key, validate_string, DEFAULT_PAGE_SIZE};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Parameters for the get_issue tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetIssueParams {
    /// Issue key (required), e.g. "PROJ-123"
    pub issue_key: String,

    /// Fields to return (optional); all navigable fields when omitted
    pub fields: Option<Vec<String>>,

    /// Entities to expand (optional), e.g. ["changelog", "renderedFields"]
    pub expand: Option<Vec<String>>,
}

/// Parameters for the search_issues tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchIssuesParams {
    /// JQL query (required), e.g. "project = PROJ AND status = Open"
    pub jql: String,

    /// Maximum issues to return, 1-100 (default: 50)
    pub limit: Option<u64>,

    /// Token from a previous page's pagination block
    pub next_page_token: Option<String>,

    /// Fields to return per issue (optional)
    pub fields: Option<Vec<String>>,

    /// Entities to expand per issue (optional)
    pub expand: Option<Vec<String>>,
}

/// Parameters for the delete_issue tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteIssueParams {
    /// Issue key (required), e.g. "PROJ-123"
    pub issue_key: String,

    /// Also delete the issue's subtasks (default: false). Jira refuses to
    /// delete an issue with subtasks unless this is set.
    #[serde(default)]
    pub delete_subtasks: bool,
}

fn join_list(values: &[String]) -> Option<String> {
    let joined = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!joined.is_empty()).then_some(joined)
}

/// Implementation of the get_issue tool
#[derive(Debug)]
pub struct GetIssueTool {
    platform: Arc<AtlassianClient>,
}

impl GetIssueTool {
    pub fn new(platform: Arc<AtlassianClient>) -> Self {
        Self { platform }
    }

    #[instrument(skip(self), fields(issue_key = params.issue_key.as_str()))]
    pub async fn execute(&self, params: GetIssueParams) -> JiraMcpResult<ToolResult> {
        let issue_key = validate_issue_key(&params.issue_key, "issue_key")?;

        let mut query = QueryParams::new();
        if let Some(fields) = params.fields.as_deref().and_then(join_list) {
            query.insert("fields".to_string(), fields);
        }
        if let Some(expand) = params.expand.as_deref().and_then(join_list) {
            query.insert("expand".to_string(), expand);
        }

        let issue = self
            .platform
            .get(&format!("issue/{}", issue_key), Some(&query))
            .await?;

        info!("Fetched issue {}", issue_key);
        Ok(ToolResult::ok(issue))
    }
}

/// Implementation of the search_issues tool
#[derive(Debug)]
pub struct SearchIssuesTool {
    platform: Arc<AtlassianClient>,
    config: Arc<JiraConfig>,
}

impl SearchIssuesTool {
    pub fn new(platform: Arc<AtlassianClient>, config: Arc<JiraConfig>) -> Self {
        Self { platform, config }
    }

    #[instrument(skip(self), fields(jql = params.jql.as_str()))]
    pub async fn execute(&self, params: SearchIssuesParams) -> JiraMcpResult<ToolResult> {
        let jql = validate_string(&params.jql, "jql")?;
        let max_limit = u64::from(self.config.max_page_size.min(MAX_PAGE_SIZE_CEILING));
        let limit = match params.limit {
            Some(limit) => validate_integer(limit, "limit", Some(1), Some(max_limit))?,
            None => DEFAULT_PAGE_SIZE.min(max_limit),
        };

        let mut body = Map::new();
        body.insert("jql".to_string(), json!(jql));
        body.insert("maxResults".to_string(), json!(limit));
        if let Some(token) = params.next_page_token.as_deref().map(str::trim) {
            if !token.is_empty() {
                body.insert("nextPageToken".to_string(), json!(token));
            }
        }
        if let Some(fields) = &params.fields {
            body.insert("fields".to_string(), json!(fields));
        }
        if let Some(expand) = params.expand.as_deref().and_then(join_list) {
            body.insert("expand".to_string(), json!(expand));
        }

        let response = self
            .platform
            .post("search/jql", Some(&Value::Object(body)))
            .await?;

        let issues = response
            .get("issues")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let next_page_token = response
            .get("nextPageToken")
            .and_then(Value::as_str)
            .map(str::to_string);
        let is_last = response
            .get("isLast")
            .and_then(Value::as_bool)
            .unwrap_or(next_page_token.is_none());

        info!("Search returned {} issues (last page: {})", issues.len(), is_last);

        Ok(ToolResult::ok_paginated(
            json!(issues),
            json!({
                "limit": limit,
                "returned": issues.len(),
                "has_more": !is_last,
                "next_page_token": next_page_token,
            }),
        ))
    }
}

/// Implementation of the delete_issue tool
#[derive(Debug)]
pub struct DeleteIssueTool {
    platform: Arc<AtlassianClient>,
    config: Arc<JiraConfig>,
}

impl DeleteIssueTool {
    pub fn new(platform: Arc<AtlassianClient>, config: Arc<JiraConfig>) -> Self {
        Self { platform, config }
    }

    #[instrument(skip(self), fields(issue_key = params.issue_key.as_str()))]
    pub async fn execute(&self, params: DeleteIssueParams) -> JiraMcpResult<ToolResult> {
        if self.config.read_only {
            warn!("Refusing to delete {} in read-only mode", params.issue_key);
            return Ok(ToolResult::fail(
                ErrorCategory::PermissionError.as_str(),
                "Server is in read-only mode; delete_issue is disabled",
                None,
            ));
        }

        let issue_key = validate_issue_key(&params.issue_key, "issue_key")?;

        let mut query = QueryParams::new();
        query.insert(
            "deleteSubtasks".to_string(),
            params.delete_subtasks.to_string(),
        );

        self.platform
            .delete(&format!("issue/{}", issue_key), Some(&query), None)
            .await?;

        info!("Deleted issue {}", issue_key);
        Ok(ToolResult::ok(json!({
            "issue_key": issue_key,
            "deleted": true,
            "message": format!("Issue {} deleted", issue_key),
        })))
    }
}
