//! Jira Service Management tools: service desks and their request types

use crate::client::{AtlassianClient, QueryParams};
use crate::config::JiraConfig;
use crate::error::JiraMcpResult;
use crate::tools::ToolResult;
use crate::validation::{validate_pagination, validate_string};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

/// Parameters for the list_service_desks tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListServiceDesksParams {
    /// Zero-based index of the first service desk (default: 0)
    pub start: Option<u64>,

    /// Maximum service desks to return (default: 50)
    pub limit: Option<u64>,
}

/// Parameters for the list_request_types tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListRequestTypesParams {
    /// Service desk ID (required), as returned by list_service_desks
    pub service_desk_id: String,

    /// Filter request types by name (optional)
    pub search_query: Option<String>,

    /// Restrict to one request type group (optional)
    pub group_id: Option<String>,

    /// Zero-based index of the first request type (default: 0)
    pub start: Option<u64>,

    /// Maximum request types to return (default: 50)
    pub limit: Option<u64>,
}

/// Implementation of the list_service_desks tool
#[derive(Debug)]
pub struct ListServiceDesksTool {
    service_management: Arc<AtlassianClient>,
    config: Arc<JiraConfig>,
}

impl ListServiceDesksTool {
    pub fn new(service_management: Arc<AtlassianClient>, config: Arc<JiraConfig>) -> Self {
        Self {
            service_management,
            config,
        }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, params: ListServiceDesksParams) -> JiraMcpResult<ToolResult> {
        let (start, limit) = validate_pagination(
            params.start,
            params.limit,
            u64::from(self.config.max_page_size),
        )?;

        let page = self
            .service_management
            .list_paginated("servicedesk", start, limit, None)
            .await?;

        info!("Listed {} service desks", page.results.len());
        Ok(ToolResult::ok_paginated(
            json!(page.results),
            page.pagination_info(),
        ))
    }
}

/// Implementation of the list_request_types tool
#[derive(Debug)]
pub struct ListRequestTypesTool {
    service_management: Arc<AtlassianClient>,
    config: Arc<JiraConfig>,
}

impl ListRequestTypesTool {
    pub fn new(service_management: Arc<AtlassianClient>, config: Arc<JiraConfig>) -> Self {
        Self {
            service_management,
            config,
        }
    }

    #[instrument(skip(self), fields(service_desk_id = params.service_desk_id.as_str()))]
    pub async fn execute(&self, params: ListRequestTypesParams) -> JiraMcpResult<ToolResult> {
        let service_desk_id = validate_string(&params.service_desk_id, "service_desk_id")?;
        let (start, limit) = validate_pagination(
            params.start,
            params.limit,
            u64::from(self.config.max_page_size),
        )?;

        let mut extra = QueryParams::new();
        for (key, value) in [
            ("searchQuery", &params.search_query),
            ("groupId", &params.group_id),
        ] {
            if let Some(value) = value.as_deref().map(str::trim) {
                if !value.is_empty() {
                    extra.insert(key.to_string(), value.to_string());
                }
            }
        }

        let page = self
            .service_management
            .list_paginated(
                &format!("servicedesk/{}/requesttype", service_desk_id),
                start,
                limit,
                Some(&extra),
            )
            .await?;

        info!(
            "Listed {} request types for service desk {}",
            page.results.len(),
            service_desk_id
        );
        Ok(ToolResult::ok_paginated(
            json!(page.results),
            page.pagination_info(),
        ))
    }
}
