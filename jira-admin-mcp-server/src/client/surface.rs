//! The two Atlassian REST dialects served from one Jira Cloud instance

use super::pagination::{parse_jsm_response, parse_platform_response, PaginatedResponse};
use serde_json::Value;
use std::fmt;

/// Which REST API a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSurface {
    /// Jira Cloud platform REST API v3 (`/rest/api/3`)
    Platform,
    /// Jira Service Management REST API (`/rest/servicedeskapi`)
    ServiceManagement,
}

impl ApiSurface {
    pub const ALL: [ApiSurface; 2] = [ApiSurface::Platform, ApiSurface::ServiceManagement];

    /// Path appended to the instance URL to form the API base URL
    pub fn path_suffix(self) -> &'static str {
        match self {
            ApiSurface::Platform => "/rest/api/3",
            ApiSurface::ServiceManagement => "/rest/servicedeskapi",
        }
    }

    /// API base URL for an instance URL
    pub fn base_url(self, instance_url: &str) -> String {
        format!("{}{}", instance_url.trim_end_matches('/'), self.path_suffix())
    }

    /// Query parameter names for page offset and page size
    pub fn pagination_params(self) -> (&'static str, &'static str) {
        match self {
            ApiSurface::Platform => ("startAt", "maxResults"),
            ApiSurface::ServiceManagement => ("start", "limit"),
        }
    }

    /// Headers added to every request on this surface
    pub fn extra_headers(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ApiSurface::Platform => &[],
            // Several JSM endpoints are feature-flagged behind this opt-in
            ApiSurface::ServiceManagement => &[("X-ExperimentalApi", "opt-in")],
        }
    }

    /// Normalise a raw list response using this surface's conventions
    pub fn parse_page(self, response: &Value, start: u64, limit: u64) -> PaginatedResponse {
        match self {
            ApiSurface::Platform => parse_platform_response(response, start, limit),
            ApiSurface::ServiceManagement => parse_jsm_response(response, start, limit),
        }
    }
}

impl fmt::Display for ApiSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiSurface::Platform => f.write_str("platform"),
            ApiSurface::ServiceManagement => f.write_str("service management"),
        }
    }
}
