//! Tools module for the Jira admin MCP server
//!
//! Every tool answers with the same [`ToolResult`] envelope so clients can
//! branch on `success` and `error.type` without parsing messages.

pub mod issues;
pub mod projects;
pub mod service_desks;

pub use issues::*;
pub use projects::*;
pub use service_desks::*;

use crate::error::{JiraMcpError, JiraMcpResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

/// Error block of a failed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error category, e.g. `NOT_FOUND` or `VALIDATION_ERROR`
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Uniform response of every tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            pagination: None,
            error: None,
        }
    }

    pub fn ok_paginated(data: Value, pagination: Value) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::ok(data)
        }
    }

    pub fn fail(
        error_type: impl Into<String>,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            pagination: None,
            error: Some(ToolError {
                error_type: error_type.into(),
                message: message.into(),
                details: details.filter(|d| !d.is_null()),
            }),
        }
    }

    /// Envelope for a failed tool execution
    pub fn from_error(tool: &str, err: &JiraMcpError) -> Self {
        if matches!(err, JiraMcpError::Internal { .. }) {
            error!("Unexpected error in tool {}: {}", tool, err);
        }
        Self::fail(err.error_type(), err.message(), err.error_data())
    }

    /// Collapse a tool outcome into an envelope
    pub fn from_outcome(tool: &str, outcome: JiraMcpResult<ToolResult>) -> Self {
        outcome.unwrap_or_else(|err| Self::from_error(tool, &err))
    }
}
