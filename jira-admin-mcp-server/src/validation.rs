//! Input validation for tool parameters
//!
//! Validators return [`JiraMcpError::InvalidParameter`] with the field name
//! and a machine-readable reason so tool envelopes can report them.

use crate::error::{JiraMcpError, JiraMcpResult};
use regex::Regex;
use std::sync::LazyLock;

/// Page size used when a tool call does not specify one
pub const DEFAULT_PAGE_SIZE: u64 = 50;

static ISSUE_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9_]+-\d+$").expect("issue key regex should be valid")
});

/// Require a non-empty string and return it trimmed
pub fn validate_string(value: &str, field: &str) -> JiraMcpResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(JiraMcpError::invalid_param(
            field,
            format!("Parameter '{}' must be a non-empty string", field),
            "invalid_type",
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a Jira issue key such as `PROJ-123`; input is upper-cased
pub fn validate_issue_key(value: &str, field: &str) -> JiraMcpResult<String> {
    let key = validate_string(value, field)?.to_uppercase();
    if !ISSUE_KEY_PATTERN.is_match(&key) {
        return Err(JiraMcpError::invalid_param(
            field,
            format!(
                "Parameter '{}' must match format PROJECT-123 (got '{}')",
                field, value
            ),
            "invalid_format",
        ));
    }
    Ok(key)
}

/// Check an integer against optional inclusive bounds
pub fn validate_integer(
    value: u64,
    field: &str,
    minimum: Option<u64>,
    maximum: Option<u64>,
) -> JiraMcpResult<u64> {
    if let Some(minimum) = minimum {
        if value < minimum {
            return Err(JiraMcpError::invalid_param(
                field,
                format!("Parameter '{}' must be at least {}", field, minimum),
                "below_minimum",
            ));
        }
    }
    if let Some(maximum) = maximum {
        if value > maximum {
            return Err(JiraMcpError::invalid_param(
                field,
                format!("Parameter '{}' must be at most {}", field, maximum),
                "above_maximum",
            ));
        }
    }
    Ok(value)
}

/// Match `value` case-insensitively against `valid_values`, returning the
/// canonical spelling
pub fn validate_enum(value: &str, field: &str, valid_values: &[&str]) -> JiraMcpResult<String> {
    let needle = value.trim();
    valid_values
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(needle))
        .map(|candidate| candidate.to_string())
        .ok_or_else(|| {
            JiraMcpError::invalid_param(
                field,
                format!(
                    "Parameter '{}' must be one of {:?} (got '{}')",
                    field, valid_values, needle
                ),
                "invalid_value",
            )
        })
}

/// Resolve `start`/`limit` tool parameters to concrete values
pub fn validate_pagination(
    start: Option<u64>,
    limit: Option<u64>,
    max_limit: u64,
) -> JiraMcpResult<(u64, u64)> {
    let start = start.unwrap_or(0);
    let limit = match limit {
        Some(limit) => validate_integer(limit, "limit", Some(1), Some(max_limit))?,
        None => DEFAULT_PAGE_SIZE.min(max_limit),
    };
    Ok((start, limit))
}
