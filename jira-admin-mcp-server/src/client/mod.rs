//! Atlassian HTTP client layer
//!
//! Authentication, retry with backoff, error classification and pagination
//! for the Jira platform and Jira Service Management REST APIs.

pub mod base;
pub mod errors;
pub mod pagination;
pub mod retry;
pub mod surface;

pub use base::{AtlassianClient, ClientOptions, Credentials, QueryParams};
pub use errors::{classify_http_error, extract_error_message};
pub use pagination::{parse_jsm_response, parse_platform_response, PaginatedResponse};
pub use retry::{parse_retry_after, RetryHandler, RetryPolicy, RetryableResponse};
pub use surface::ApiSurface;
