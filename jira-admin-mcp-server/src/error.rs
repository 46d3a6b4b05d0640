//! Error types and handling for the Jira admin MCP server
//!
//! Every failure coming out of the Atlassian client layer is an [`ApiError`]
//! tagged with an [`ErrorCategory`]. The crate-level [`JiraMcpError`] wraps
//! those together with configuration and input validation failures and maps
//! them to MCP JSON-RPC error codes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Category of a failed Atlassian call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// HTTP 400
    ValidationError,
    /// HTTP 401
    AuthenticationError,
    /// HTTP 403
    PermissionError,
    /// HTTP 404
    NotFound,
    /// HTTP 409
    Conflict,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// Connect failure, timeout, or no connection established
    NetworkError,
    /// Any status code without a dedicated category
    UnknownError,
}

impl ErrorCategory {
    /// Wire name of the category, as reported in tool error envelopes
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ValidationError => "VALIDATION_ERROR",
            ErrorCategory::AuthenticationError => "AUTHENTICATION_ERROR",
            ErrorCategory::PermissionError => "PERMISSION_ERROR",
            ErrorCategory::NotFound => "NOT_FOUND",
            ErrorCategory::Conflict => "CONFLICT",
            ErrorCategory::RateLimited => "RATE_LIMITED",
            ErrorCategory::ServerError => "SERVER_ERROR",
            ErrorCategory::NetworkError => "NETWORK_ERROR",
            ErrorCategory::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure of an Atlassian API call
///
/// Produced either by the error classifier (for HTTP responses with a status
/// of 400 or above) or directly by the client for network-level failures,
/// which never carry a status code.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{category}: {message}")]
pub struct ApiError {
    pub category: ErrorCategory,
    pub message: String,
    /// Raw response body, kept for debugging
    pub details: Option<Value>,
    pub status_code: Option<u16>,
    /// Server retry hint in seconds, only set for rate limiting
    pub retry_after: Option<f64>,
}

impl ApiError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            details: None,
            status_code: None,
            retry_after: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }

    pub fn with_retry_after(mut self, retry_after: Option<f64>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Connection, timeout or lifecycle failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NetworkError, message)
    }

    /// Rejected credentials
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::AuthenticationError, message).with_status(401)
    }

    pub fn is_network(&self) -> bool {
        self.category == ErrorCategory::NetworkError
    }
}

/// Result type alias for the Atlassian client layer
pub type ApiResult<T> = Result<T, ApiError>;

/// Custom error types for the Jira admin MCP server
#[derive(Debug, Error)]
pub enum JiraMcpError {
    /// Configuration errors (-32001)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Classified Atlassian API or network errors
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Invalid tool parameter (-32006)
    #[error("{message}")]
    InvalidParameter {
        parameter: String,
        message: String,
        reason: String,
    },

    /// Internal server errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl JiraMcpError {
    /// Get the MCP JSON-RPC error code for this error
    pub fn error_code(&self) -> i32 {
        match self {
            JiraMcpError::Configuration { .. } => -32001,
            JiraMcpError::Api(api) => match api.category {
                ErrorCategory::AuthenticationError => -32002,
                ErrorCategory::NetworkError => -32003,
                ErrorCategory::PermissionError => -32004,
                ErrorCategory::NotFound => -32005,
                ErrorCategory::ValidationError => -32006,
                ErrorCategory::RateLimited => -32007,
                ErrorCategory::Conflict => -32008,
                ErrorCategory::ServerError | ErrorCategory::UnknownError => -32603,
            },
            JiraMcpError::InvalidParameter { .. } => -32006,
            JiraMcpError::Internal { .. } => -32603,
        }
    }

    /// Error type reported in tool envelopes
    pub fn error_type(&self) -> &'static str {
        match self {
            JiraMcpError::Configuration { .. } => "CONFIGURATION_ERROR",
            JiraMcpError::Api(api) => api.category.as_str(),
            JiraMcpError::InvalidParameter { .. } => ErrorCategory::ValidationError.as_str(),
            JiraMcpError::Internal { .. } => ErrorCategory::ServerError.as_str(),
        }
    }

    /// Human-readable message without the category prefix
    pub fn message(&self) -> String {
        match self {
            JiraMcpError::Api(api) => api.message.clone(),
            other => other.to_string(),
        }
    }

    /// Get additional error data for error responses
    pub fn error_data(&self) -> Option<Value> {
        match self {
            JiraMcpError::Api(api) => api.details.clone(),
            JiraMcpError::InvalidParameter {
                parameter, reason, ..
            } => {
                let mut data = serde_json::Map::new();
                data.insert("field".to_string(), Value::String(parameter.clone()));
                data.insert("reason".to_string(), Value::String(reason.clone()));
                Some(Value::Object(data))
            }
            _ => None,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        JiraMcpError::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_param(
        parameter: impl Into<String>,
        message: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        JiraMcpError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        JiraMcpError::Internal {
            message: message.into(),
        }
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for JiraMcpError {
    fn from(err: serde_json::Error) -> Self {
        JiraMcpError::internal(format!("JSON error: {}", err))
    }
}

/// Result type alias for Jira MCP operations
pub type JiraMcpResult<T> = Result<T, JiraMcpError>;
