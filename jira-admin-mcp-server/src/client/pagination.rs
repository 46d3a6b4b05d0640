//! Pagination handling for Atlassian API responses
//!
//! The Jira platform API pages with `startAt`/`maxResults`/`total`, the
//! service management API with `start`/`limit`/`size`/`isLastPage`. Both are
//! normalised into [`PaginatedResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Standardised pagination result returned by all list operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse {
    pub results: Vec<Value>,
    pub start: u64,
    pub limit: u64,
    /// Best-effort total; see `total_is_estimate`
    pub total: u64,
    pub has_more: bool,
    /// Set when the server gave no total and more pages exist. `total` is
    /// then `start + size + 1`, a lower bound and not a count.
    pub total_is_estimate: bool,
}

impl PaginatedResponse {
    /// Pagination block for tool envelopes
    pub fn pagination_info(&self) -> Value {
        json!({
            "start": self.start,
            "limit": self.limit,
            "total": self.total,
            "has_more": self.has_more,
            "total_is_estimate": self.total_is_estimate,
        })
    }
}

fn u64_field(response: &Value, key: &str) -> Option<u64> {
    response.get(key).and_then(Value::as_u64)
}

/// Parse a Jira platform API page.
///
/// Results are read from the first of `issues`, `values`, `results` that
/// holds an array. `requested_start`/`requested_limit` fill in for fields the
/// server omitted.
pub fn parse_platform_response(
    response: &Value,
    requested_start: u64,
    requested_limit: u64,
) -> PaginatedResponse {
    let total = u64_field(response, "total").unwrap_or(0);
    let start = u64_field(response, "startAt").unwrap_or(requested_start);
    let limit = u64_field(response, "maxResults").unwrap_or(requested_limit);

    let results = ["issues", "values", "results"]
        .iter()
        .find_map(|key| response.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    let has_more = start.saturating_add(results.len() as u64) < total;

    PaginatedResponse {
        results,
        start,
        limit,
        total,
        has_more,
        total_is_estimate: false,
    }
}

/// Parse a Jira Service Management API page.
///
/// JSM does not always report a total. When absent it is derived: exact on
/// the last page, otherwise `start + size + 1` to signal that more exist.
pub fn parse_jsm_response(
    response: &Value,
    requested_start: u64,
    requested_limit: u64,
) -> PaginatedResponse {
    let results = response
        .get("values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let start = u64_field(response, "start").unwrap_or(requested_start);
    let limit = u64_field(response, "limit").unwrap_or(requested_limit);
    let size = u64_field(response, "size").unwrap_or(results.len() as u64);
    let is_last_page = response
        .get("isLastPage")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let (total, total_is_estimate) = match u64_field(response, "total") {
        Some(total) => (total, false),
        None if is_last_page => (start.saturating_add(size), false),
        None => (start.saturating_add(size).saturating_add(1), true),
    };

    PaginatedResponse {
        results,
        start,
        limit,
        total,
        has_more: !is_last_page,
        total_is_estimate,
    }
}
