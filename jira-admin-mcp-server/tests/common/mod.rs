/// Common utilities for Jira Admin MCP Server integration tests
use jira_admin_mcp_server::client::{
    ApiSurface, AtlassianClient, ClientOptions, Credentials, RetryHandler, RetryPolicy,
};
use jira_admin_mcp_server::config::JiraConfig;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

pub const TEST_EMAIL: &str = "admin@example.com";
pub const TEST_TOKEN: &str = "test-api-token";

/// Retry policy that retries `max_retries` times without sleeping
#[allow(dead_code)]
pub fn immediate_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay_secs: 0.0,
        max_delay_secs: 0.0,
        multiplier: 1.0,
    }
}

/// Retry handler with the production retry counts and no delays
#[allow(dead_code)]
pub fn immediate_retry() -> RetryHandler {
    RetryHandler::new(
        immediate_policy(RetryPolicy::rate_limit().max_retries),
        immediate_policy(RetryPolicy::server_error().max_retries),
    )
}

/// Connected client for `surface` pointing at the mock server
#[allow(dead_code)]
pub async fn connected_client(
    server: &MockServer,
    surface: ApiSurface,
    retry: RetryHandler,
) -> AtlassianClient {
    let client = AtlassianClient::new(
        surface,
        surface.base_url(&server.uri()),
        Credentials::new(TEST_EMAIL, TEST_TOKEN),
        ClientOptions {
            timeout: Duration::from_secs(5),
            retry,
        },
    );
    client.connect().await.expect("client connects");
    client
}

/// Server configuration pointing at the mock server
#[allow(dead_code)]
pub fn mock_config(server: &MockServer) -> JiraConfig {
    JiraConfig {
        instance_url: server.uri(),
        user_email: TEST_EMAIL.to_string(),
        api_token: TEST_TOKEN.to_string(),
        request_timeout_seconds: 5,
        retry: immediate_retry(),
        ..Default::default()
    }
}

/// Answer the startup credential check with a user record
#[allow(dead_code)]
pub async fn mount_myself(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/api/3/myself"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "5b10ac8d82e05b22cc7d4ef5",
            "displayName": "Test Admin",
            "emailAddress": TEST_EMAIL,
        })))
        .mount(server)
        .await;
}

/// An address nothing listens on
#[allow(dead_code)]
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

/// MCP Test Client for sending JSON-RPC requests to the server binary
#[allow(dead_code)]
pub struct McpTestClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

#[allow(dead_code)]
impl McpTestClient {
    /// Spawn the server against the Jira instance configured in `.env`
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::from_filename(".env").ok();

        let instance_url = std::env::var("JIRA_INSTANCE_URL")?;
        let user_email = std::env::var("JIRA_USER_EMAIL")?;
        let api_token = std::env::var("JIRA_API_TOKEN")?;

        let mut child = Command::new(env!("CARGO_BIN_EXE_jira-admin-mcp-server"))
            .env("JIRA_INSTANCE_URL", instance_url)
            .env("JIRA_USER_EMAIL", user_email)
            .env("JIRA_API_TOKEN", api_token)
            .env("JIRA_READ_ONLY", "true")
            .env("RUST_LOG", "error")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().ok_or("Failed to open stdin")?;
        let stdout = child.stdout.take().ok_or("Failed to open stdout")?;

        let mut client = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };
        client.initialize()?;

        Ok(client)
    }

    fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "rust-test-client",
                    "version": "1.0.0"
                }
            }
        });

        self.send_request(&request)?;
        let response = self.read_response()?;

        if response.get("error").is_some() {
            return Err(format!("Initialization failed: {:?}", response["error"]).into());
        }

        Ok(())
    }

    /// Call an MCP tool
    pub fn call_tool(
        &mut self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Value, Box<dyn std::error::Error>> {
        let request_id = REQUEST_ID.fetch_add(1, Ordering::SeqCst);

        let request = json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "method": "tools/call",
            "params": {
                "name": tool_name,
                "arguments": arguments
            }
        });

        self.send_request(&request)?;
        self.read_response()
    }

    fn send_request(&mut self, request: &Value) -> Result<(), Box<dyn std::error::Error>> {
        writeln!(self.stdin, "{}", serde_json::to_string(request)?)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_response(&mut self) -> Result<Value, Box<dyn std::error::Error>> {
        let mut line = String::new();
        self.stdout.read_line(&mut line)?;

        if line.is_empty() {
            return Err("Server closed connection".into());
        }

        Ok(serde_json::from_str(&line)?)
    }

    /// Extract the tool envelope from a `tools/call` response
    pub fn extract_tool_result(response: &Value) -> Result<Value, String> {
        if let Some(error) = response.get("error") {
            return Err(format!("Tool call failed: {:?}", error));
        }

        let text = response
            .get("result")
            .and_then(|r| r.get("content"))
            .and_then(Value::as_array)
            .and_then(|content| {
                content
                    .iter()
                    .find(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            })
            .and_then(|item| item.get("text"))
            .and_then(Value::as_str)
            .ok_or("No text content in tool result")?;

        serde_json::from_str(text)
            .map_err(|e| format!("Failed to parse tool result JSON: {}. Text was: {}", e, text))
    }
}

impl Drop for McpTestClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Project key used by live tests, from `TEST_PROJECT_KEY`
#[allow(dead_code)]
pub fn test_project_key() -> String {
    std::env::var("TEST_PROJECT_KEY").unwrap_or_else(|_| "SCRUM".to_string())
}
