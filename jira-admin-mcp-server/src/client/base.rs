//! Authenticated HTTP client for Atlassian Cloud REST APIs
//!
//! Owns one connection handle per API surface. Every request goes through
//! the [`RetryHandler`]; failed responses are turned into classified
//! [`ApiError`]s and transport failures into `NETWORK_ERROR`s.

use super::errors::classify_http_error;
use super::pagination::PaginatedResponse;
use super::retry::{parse_retry_after, RetryHandler, RetryableResponse};
use super::surface::ApiSurface;
use crate::config::JiraConfig;
use crate::error::{ApiError, ApiResult, ErrorCategory};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Query string parameters; later inserts override earlier ones
pub type QueryParams = BTreeMap<String, String>;

/// Account email and API token used for Basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    api_token: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_token: api_token.into(),
        }
    }

    fn authorization_header(&self) -> String {
        let raw = format!("{}:{}", self.email, self.api_token);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Transport settings shared by both surfaces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientOptions {
    /// Connect and response timeout for every request
    pub timeout: Duration,
    pub retry: RetryHandler,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryHandler::default(),
        }
    }
}

/// HTTP client for one Atlassian REST API base URL
#[derive(Debug)]
pub struct AtlassianClient {
    surface: ApiSurface,
    base_url: String,
    credentials: Credentials,
    options: ClientOptions,
    /// `None` until `connect()` and after `disconnect()`
    connection: RwLock<Option<Client>>,
}

impl AtlassianClient {
    pub fn new(
        surface: ApiSurface,
        base_url: impl Into<String>,
        credentials: Credentials,
        options: ClientOptions,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            surface,
            base_url,
            credentials,
            options,
            connection: RwLock::new(None),
        }
    }

    /// Client for the Jira platform REST API v3
    pub fn platform(config: &JiraConfig) -> Self {
        Self::for_surface(ApiSurface::Platform, config)
    }

    /// Client for the Jira Service Management REST API
    pub fn service_management(config: &JiraConfig) -> Self {
        Self::for_surface(ApiSurface::ServiceManagement, config)
    }

    fn for_surface(surface: ApiSurface, config: &JiraConfig) -> Self {
        Self::new(
            surface,
            surface.base_url(&config.instance_url),
            config.credentials(),
            config.client_options(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn surface(&self) -> ApiSurface {
        self.surface
    }

    /// Instance root, i.e. the base URL without its API path suffix
    pub fn instance_url(&self) -> &str {
        ApiSurface::ALL
            .iter()
            .find_map(|surface| self.base_url.strip_suffix(surface.path_suffix()))
            .unwrap_or(&self.base_url)
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Establish the connection handle with auth and default JSON headers.
    ///
    /// Calling it again replaces the existing handle.
    pub async fn connect(&self) -> ApiResult<()> {
        let client = Client::builder()
            .default_headers(self.default_headers()?)
            .timeout(self.options.timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {}", e)))?;

        *self.connection.write().await = Some(client);
        info!("HTTP client connected to {}", self.base_url);
        Ok(())
    }

    /// Drop the connection handle; a no-op when not connected
    pub async fn disconnect(&self) {
        if self.connection.write().await.take().is_some() {
            info!("HTTP client disconnected from {}", self.base_url);
        }
    }

    fn default_headers(&self) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut authorization = HeaderValue::from_str(&self.credentials.authorization_header())
            .map_err(|_| {
                ApiError::new(
                    ErrorCategory::AuthenticationError,
                    "Credentials cannot be encoded as an HTTP header",
                )
            })?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        for &(name, value) in self.surface.extra_headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::network(format!("Invalid header name {}: {}", name, e)))?;
            headers.insert(name, HeaderValue::from_static(value));
        }

        Ok(headers)
    }

    async fn connection(&self) -> ApiResult<Client> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| ApiError::network("Client not connected. Call connect() first."))
    }

    fn endpoint_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// GET `path`; an empty body yields `{}`
    pub async fn get(&self, path: &str, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.execute(Method::GET, path, params, None, false)
            .await
            .map(Option::unwrap_or_default)
    }

    /// POST `body` to `path`; an empty body yields `{}`
    pub async fn post(&self, path: &str, body: Option<&Value>) -> ApiResult<Value> {
        self.execute(Method::POST, path, None, body, false)
            .await
            .map(Option::unwrap_or_default)
    }

    /// PUT `body` to `path`; an empty body yields `{}`
    pub async fn put(&self, path: &str, body: Option<&Value>) -> ApiResult<Value> {
        self.execute(Method::PUT, path, None, body, false)
            .await
            .map(Option::unwrap_or_default)
    }

    /// DELETE `path`; 204 or an empty body yields `None`.
    ///
    /// Some JSM endpoints take a JSON body on DELETE.
    pub async fn delete(
        &self,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<&Value>,
    ) -> ApiResult<Option<Value>> {
        self.execute(Method::DELETE, path, params, body, true).await
    }

    /// GET one page of a list endpoint using this surface's pagination
    /// parameter names. `extra_params` override the paging parameters.
    #[instrument(skip(self, extra_params), fields(surface = %self.surface))]
    pub async fn list_paginated(
        &self,
        path: &str,
        start: u64,
        limit: u64,
        extra_params: Option<&QueryParams>,
    ) -> ApiResult<PaginatedResponse> {
        let (start_param, limit_param) = self.surface.pagination_params();
        let mut params = QueryParams::new();
        params.insert(start_param.to_string(), start.to_string());
        params.insert(limit_param.to_string(), limit.to_string());
        if let Some(extra) = extra_params {
            params.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let response = self.get(path, Some(&params)).await?;
        Ok(self.surface.parse_page(&response, start, limit))
    }

    /// Check the credentials against `/rest/api/3/myself` on the instance
    /// root and return the user record.
    ///
    /// Not retried: this runs once at startup to fail fast.
    #[instrument(skip(self))]
    pub async fn validate_credentials(&self) -> ApiResult<Value> {
        let client = self.connection().await?;
        let url = format!("{}/rest/api/3/myself", self.instance_url());

        let response = client.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::network(format!("Connection timed out: {}", e))
            } else {
                ApiError::network(format!("Failed to connect to {}: {}", self.base_url, e))
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(classify_http_error(401, None, None));
        }
        if status.as_u16() >= 400 {
            return Err(error_from_response(response).await);
        }

        Ok(read_success_body(response, false).await?.unwrap_or_default())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<&Value>,
        allow_empty: bool,
    ) -> ApiResult<Option<Value>> {
        let url = self.endpoint_url(path);

        debug!("{} {} params={:?}", method, path, params);

        // The handle is looked up per attempt so a disconnect during backoff
        // stops the retries
        let response = self
            .options
            .retry
            .execute_with_retry(move || {
                let method = method.clone();
                let url = url.clone();
                async move {
                    let client = self.connection().await?;
                    let mut request = client.request(method, url.as_str());
                    if let Some(params) = params {
                        request = request.query(params);
                    }
                    if let Some(body) = body {
                        request = request.json(body);
                    }
                    request.send().await.map_err(transport_error)
                }
            })
            .await?;

        if response.status().as_u16() < 400 {
            read_success_body(response, allow_empty).await
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Connect failures and timeouts become network errors; they carry no status
fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::network(format!("Request timed out: {}", err))
    } else if err.is_connect() {
        ApiError::network(format!("Connection failed: {}", err))
    } else {
        ApiError::network(format!("HTTP request failed: {}", err))
    }
}

async fn read_success_body(response: Response, allow_empty: bool) -> ApiResult<Option<Value>> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(transport_error)?;
    let empty = bytes.iter().all(u8::is_ascii_whitespace);

    if allow_empty && (status == StatusCode::NO_CONTENT || empty) {
        return Ok(None);
    }
    if empty {
        return Ok(Some(Value::Object(Default::default())));
    }

    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        ApiError::new(
            ErrorCategory::UnknownError,
            format!("Invalid JSON in HTTP {} response: {}", status.as_u16(), e),
        )
        .with_status(status.as_u16())
    })
}

/// Classify a failed response. An unparseable body is treated as absent.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let retry_after = response.retry_after_header().and_then(parse_retry_after);
    let body = response
        .bytes()
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());

    classify_http_error(status, body.as_ref(), retry_after)
}
