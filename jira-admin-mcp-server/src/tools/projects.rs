//! Project listing tool

use crate::client::{AtlassianClient, QueryParams};
use crate::config::JiraConfig;
use crate::error::JiraMcpResult;
use crate::tools::ToolResult;
use crate::validation::{validate_enum, validate_pagination};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

const PROJECT_TYPE_KEYS: [&str; 3] = ["software", "service_desk", "business"];

/// Parameters for the list_projects tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListProjectsParams {
    /// Filter by project name or key (optional, partial match)
    pub query: Option<String>,

    /// Filter by project type: "software", "service_desk" or "business"
    pub type_key: Option<String>,

    /// Entities to expand, e.g. "description,lead"
    pub expand: Option<String>,

    /// Zero-based index of the first project (default: 0)
    pub start: Option<u64>,

    /// Maximum projects to return (default: 50)
    pub limit: Option<u64>,
}

/// Implementation of the list_projects tool
#[derive(Debug)]
pub struct ListProjectsTool {
    platform: Arc<AtlassianClient>,
    config: Arc<JiraConfig>,
}

impl ListProjectsTool {
    pub fn new(platform: Arc<AtlassianClient>, config: Arc<JiraConfig>) -> Self {
        Self { platform, config }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, params: ListProjectsParams) -> JiraMcpResult<ToolResult> {
        let (start, limit) = validate_pagination(
            params.start,
            params.limit,
            u64::from(self.config.max_page_size),
        )?;

        let mut extra = QueryParams::new();
        if let Some(query) = params.query.as_deref().map(str::trim) {
            if !query.is_empty() {
                extra.insert("query".to_string(), query.to_string());
            }
        }
        if let Some(type_key) = &params.type_key {
            extra.insert(
                "typeKey".to_string(),
                validate_enum(type_key, "type_key", &PROJECT_TYPE_KEYS)?,
            );
        }
        if let Some(expand) = params.expand.as_deref().map(str::trim) {
            if !expand.is_empty() {
                extra.insert("expand".to_string(), expand.to_string());
            }
        }

        let page = self
            .platform
            .list_paginated("project/search", start, limit, Some(&extra))
            .await?;

        info!("Listed {} projects (total {})", page.results.len(), page.total);
        Ok(ToolResult::ok_paginated(
            json!(page.results),
            page.pagination_info(),
        ))
    }
}
