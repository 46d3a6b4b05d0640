//! Error classification for Atlassian API responses
//!
//! Maps an HTTP status code and optional JSON body onto an [`ApiError`]. The
//! mapping is total: every status code lands in exactly one category.

use crate::error::{ApiError, ErrorCategory};
use serde_json::Value;

/// Extract the human-readable error text from an Atlassian error body.
///
/// Atlassian APIs report errors in three shapes, checked in this order:
/// `{"errorMessages": [..]}`, `{"message": ".."}` and `{"errors": {field: reason}}`.
///
/// Only non-blank strings and numbers count as text; null, booleans and
/// blank strings are treated as absent. A non-empty `errorMessages` array
/// decides the result on its own: when none of its entries is text the
/// result is `None` and the caller falls back to its default message. An
/// empty array is ignored and the next shape is checked.
pub fn extract_error_message(body: Option<&Value>) -> Option<String> {
    let body = body?.as_object()?;

    if let Some(Value::Array(messages)) = body.get("errorMessages") {
        if !messages.is_empty() {
            let texts = messages.iter().filter_map(value_text).collect::<Vec<_>>();
            return (!texts.is_empty()).then(|| texts.join("; "));
        }
    }

    if let Some(message) = body.get("message").and_then(value_text) {
        return Some(message);
    }

    if let Some(Value::Object(errors)) = body.get("errors") {
        if !errors.is_empty() {
            return Some(
                errors
                    .iter()
                    .map(|(field, reason)| {
                        format!(
                            "{}: {}",
                            field,
                            value_text(reason).unwrap_or_else(|| reason.to_string())
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            );
        }
    }

    None
}

/// Text of a non-blank string or a number; strings are taken without quotes
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Map an HTTP error response onto a classified [`ApiError`].
///
/// Pure and infallible. `retry_after` is only kept for rate limiting.
pub fn classify_http_error(
    status_code: u16,
    response_body: Option<&Value>,
    retry_after: Option<f64>,
) -> ApiError {
    let detail = extract_error_message(response_body);
    let details = response_body
        .filter(|body| match body {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        })
        .cloned();

    let (category, default_message) = match status_code {
        400 => (
            ErrorCategory::ValidationError,
            "Bad request - invalid parameters.".to_string(),
        ),
        401 => (
            ErrorCategory::AuthenticationError,
            "Authentication failed. Check JIRA_USER_EMAIL and JIRA_API_TOKEN.".to_string(),
        ),
        403 => (
            ErrorCategory::PermissionError,
            "Insufficient permissions for this operation.".to_string(),
        ),
        404 => (
            ErrorCategory::NotFound,
            "The requested resource was not found.".to_string(),
        ),
        409 => (ErrorCategory::Conflict, "Resource conflict.".to_string()),
        429 => (
            ErrorCategory::RateLimited,
            "Rate limited by Atlassian API.".to_string(),
        ),
        500..=599 => (
            ErrorCategory::ServerError,
            format!("Atlassian server error (HTTP {}).", status_code),
        ),
        _ => (
            ErrorCategory::UnknownError,
            format!("Unexpected HTTP {} response.", status_code),
        ),
    };

    let error = ApiError::new(category, detail.unwrap_or(default_message))
        .with_status(status_code)
        .with_details(details);

    if category == ErrorCategory::RateLimited {
        error.with_retry_after(retry_after)
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_status_mapping() {
        let cases = [
            (400, ErrorCategory::ValidationError),
            (401, ErrorCategory::AuthenticationError),
            (403, ErrorCategory::PermissionError),
            (404, ErrorCategory::NotFound),
            (409, ErrorCategory::Conflict),
            (429, ErrorCategory::RateLimited),
        ];
        for (status, category) in cases {
            let err = classify_http_error(status, None, None);
            assert_eq!(err.category, category, "status {}", status);
            assert_eq!(err.status_code, Some(status));
        }
    }

    #[test]
    fn test_server_error_range() {
        for status in 500..600 {
            let err = classify_http_error(status, None, None);
            assert_eq!(err.category, ErrorCategory::ServerError);
            assert_eq!(err.status_code, Some(status));
        }
        assert!(classify_http_error(503, None, None).message.contains("503"));
    }

    #[test]
    fn test_unmapped_statuses_are_unknown() {
        for status in [0, 100, 200, 302, 402, 405, 418, 422, 499, 600, 999, u16::MAX] {
            let err = classify_http_error(status, None, None);
            assert_eq!(err.category, ErrorCategory::UnknownError, "status {}", status);
            assert_eq!(err.status_code, Some(status));
            assert!(err.message.contains(&status.to_string()));
        }
    }

    #[test]
    fn test_classification_is_stable() {
        let body = json!({"errorMessages": ["Issue does not exist"]});
        for status in [400, 404, 429, 502, 418] {
            assert_eq!(
                classify_http_error(status, Some(&body), Some(3.0)),
                classify_http_error(status, Some(&body), Some(3.0))
            );
        }
    }

    #[test]
    fn test_default_messages() {
        let auth = classify_http_error(401, None, None);
        assert!(auth.message.contains("JIRA_USER_EMAIL"));
        assert!(auth.message.contains("JIRA_API_TOKEN"));
        assert_eq!(
            classify_http_error(404, None, None).message,
            "The requested resource was not found."
        );
    }

    #[test]
    fn test_error_messages_win_over_message() {
        let body = json!({
            "errorMessages": ["First problem", "Second problem"],
            "message": "ignored"
        });
        let err = classify_http_error(400, Some(&body), None);
        assert_eq!(err.message, "First problem; Second problem");
        assert_eq!(err.details, Some(body));
    }

    #[test]
    fn test_message_used_verbatim() {
        let body = json!({"message": "Project key already in use"});
        let err = classify_http_error(409, Some(&body), None);
        assert_eq!(err.message, "Project key already in use");
    }

    #[test]
    fn test_field_errors_are_joined() {
        let body = json!({"errors": {"summary": "Summary is required"}});
        let err = classify_http_error(400, Some(&body), None);
        assert_eq!(err.message, "summary: Summary is required");
    }

    #[test]
    fn test_empty_error_messages_fall_through() {
        let body = json!({"errorMessages": [], "errors": {"key": "Invalid key"}});
        assert_eq!(
            extract_error_message(Some(&body)),
            Some("key: Invalid key".to_string())
        );
        assert_eq!(extract_error_message(Some(&json!({}))), None);
        assert_eq!(extract_error_message(Some(&json!("text"))), None);
        assert_eq!(extract_error_message(None), None);
    }

    #[test]
    fn test_non_text_entries_are_ignored() {
        let body = json!({"errorMessages": [null, true, false, "", "  ", 42, "Bad JQL"]});
        assert_eq!(
            extract_error_message(Some(&body)),
            Some("42; Bad JQL".to_string())
        );

        for message in [json!(true), json!(false), json!(null), json!(" ")] {
            let body = json!({"message": message, "errors": {"jql": "Invalid"}});
            assert_eq!(
                extract_error_message(Some(&body)),
                Some("jql: Invalid".to_string()),
                "message {}",
                message
            );
        }
    }

    #[test]
    fn test_blank_error_messages_use_category_default() {
        let body = json!({
            "errorMessages": ["", null],
            "message": "not used",
            "errors": {"key": "not used either"}
        });
        assert_eq!(extract_error_message(Some(&body)), None);

        let err = classify_http_error(404, Some(&body), None);
        assert_eq!(err.message, "The requested resource was not found.");
        assert_eq!(err.details, Some(body));
    }

    #[test]
    fn test_retry_after_only_on_rate_limit() {
        let limited = classify_http_error(429, None, Some(12.0));
        assert_eq!(limited.retry_after, Some(12.0));
        let server = classify_http_error(503, None, Some(12.0));
        assert_eq!(server.retry_after, None);
    }

    #[test]
    fn test_empty_body_gives_no_details() {
        assert_eq!(classify_http_error(500, Some(&json!({})), None).details, None);
    }
}
