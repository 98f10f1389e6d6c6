use std::sync::Arc;

use clap::{Args, Subcommand};
use configcat_core::RegistryError;
use configcat_core::auth::{basic_auth_header, redact};
use serde_json::{Value, json};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

pub mod catalog;
pub mod docs;
pub mod engine;
pub mod executor;
pub mod normalize;

pub use engine::{Engine, InvocationError, ToolListing};
pub use executor::{HttpExecutor, HttpResponse, TransportError};
pub use normalize::ToolResult;

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const MCP_SERVER_NAME: &str = "ConfigCat MCP";
pub const MCP_SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_BASE_URL: &str = "https://api.configcat.com";

const CATALOG_RESOURCE_URI: &str = "configcat://catalog";
const SDK_REFERENCE_RESOURCE_URI: &str = "configcat://docs/sdk-reference";

#[derive(Subcommand, Clone, Debug)]
pub enum McpCommands {
    /// Run the ConfigCat MCP server over stdio (default)
    Serve(ServeArgs),
    /// Print the registered endpoint catalog as JSON and exit
    Catalog,
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Skip fetching the SDK documentation index at startup
    #[arg(long, env = "CONFIGCAT_MCP_NO_DOCS")]
    pub no_docs: bool,
    /// Location of the documentation index the SDK Reference is read from
    #[arg(long, env = "CONFIGCAT_DOCS_URL", default_value = docs::DEFAULT_DOCS_URL)]
    pub docs_url: String,
}

/// Everything the runtime needs at startup. Read-only afterwards.
#[derive(Clone)]
pub struct RuntimeConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub docs_url: String,
    pub fetch_docs: bool,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("base_url", &self.base_url)
            .field("username", &redact(&self.username))
            .field("password", &"****")
            .field("user_agent", &self.user_agent)
            .field("docs_url", &self.docs_url)
            .field("fetch_docs", &self.fetch_docs)
            .finish()
    }
}

impl RuntimeConfig {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            user_agent: format!("{MCP_SERVER_NAME}/{MCP_SERVER_VERSION}"),
            docs_url: docs::DEFAULT_DOCS_URL.to_string(),
            fetch_docs: true,
        }
    }

    pub fn validate(&self) -> Result<(), StartupError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(StartupError::MissingCredentials);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(
        "Please set CONFIGCAT_API_USER and CONFIGCAT_API_PASS environment variables (Public API credentials). You can create your credentials on the Public API credentials management page: https://app.configcat.com/my-account/public-api-credentials."
    )]
    MissingCredentials,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to read MCP message: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to write MCP response: {0}")]
    Write(#[source] std::io::Error),
}

pub async fn run(base_url: &str, username: &str, password: &str, command: McpCommands) -> i32 {
    match command {
        McpCommands::Serve(args) => {
            let mut config = RuntimeConfig::new(base_url, username, password);
            config.docs_url = args.docs_url;
            config.fetch_docs = !args.no_docs;

            let engine = match build_engine(&config).await {
                Ok(engine) => engine,
                Err(err) => {
                    error!(error = %err, "startup failed");
                    eprintln!("{err}");
                    return 1;
                }
            };
            info!(
                base_url = %config.base_url,
                user = %redact(&config.username),
                tools = engine.tools().len(),
                "serving ConfigCat MCP over stdio"
            );

            match McpServer::new(engine).serve_stdio().await {
                Ok(()) => 0,
                Err(err) => {
                    error!(error = %err, "MCP server stopped");
                    1
                }
            }
        }
        McpCommands::Catalog => match catalog::load_registry() {
            Ok(registry) => {
                println!("{}", to_pretty_json(&catalog::catalog_index(&registry)));
                0
            }
            Err(err) => {
                error!(error = %err, "endpoint catalog is invalid");
                1
            }
        },
    }
}

/// Validates the configuration, loads the registry and, when enabled, the SDK
/// documentation. A failed documentation fetch only disables the docs tool.
pub async fn build_engine(config: &RuntimeConfig) -> Result<Engine, StartupError> {
    config.validate()?;

    let http = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(StartupError::Client)?;
    let registry = catalog::load_registry()?;
    let executor = HttpExecutor::new(
        http.clone(),
        &config.base_url,
        &basic_auth_header(&config.username, &config.password),
        &config.user_agent,
    )?;
    let mut engine = Engine::new(Arc::new(registry), executor, http.clone());

    if config.fetch_docs {
        match docs::load_sdk_docs(&http, &config.docs_url).await {
            Ok(sdk_docs) => {
                debug!(url = %config.docs_url, "SDK documentation loaded");
                engine = engine.with_docs(sdk_docs);
            }
            Err(err) => {
                warn!(error = %err, "SDK documentation tool disabled");
            }
        }
    }
    Ok(engine)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    ContentLength,
    Newline,
}

pub struct McpServer {
    engine: Engine,
}

impl McpServer {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub async fn serve_stdio(&self) -> Result<(), ServerError> {
        let reader = BufReader::new(io::stdin());
        self.serve(reader, io::stdout()).await
    }

    /// Answers messages in arrival order until the reader is exhausted. Each
    /// reply uses the framing of the message it answers.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let Some(incoming) = read_message(&mut reader)
                .await
                .map_err(ServerError::Read)?
            else {
                break;
            };

            let (responses, framing) = match incoming {
                Incoming::Payload(payload, framing) => {
                    let responses = match serde_json::from_slice::<Value>(&payload) {
                        Ok(incoming) => self.handle_incoming_message(incoming).await,
                        Err(e) => vec![error_response(
                            Value::Null,
                            RpcError::parse_error(format!("Invalid JSON payload: {e}")),
                        )],
                    };
                    (responses, framing)
                }
                Incoming::Rejected(error, framing) => {
                    warn!(code = error.code, message = %error.message, "rejected MCP message");
                    (vec![error_response(Value::Null, error)], framing)
                }
            };
            for response in responses {
                write_message(&mut writer, &response, framing)
                    .await
                    .map_err(ServerError::Write)?;
            }
        }

        Ok(())
    }

    pub async fn handle_incoming_message(&self, incoming: Value) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Some(batch) = incoming.as_array() {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(item.clone()).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        // No method: a response to a request we never send.
        let method = obj.get("method").and_then(Value::as_str)?;

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        match obj.get("id").cloned() {
            Some(id) => {
                debug!(method, "request");
                Some(match self.handle_request(method, params).await {
                    Ok(payload) => success_response(id, payload),
                    Err(err) => error_response(id, err),
                })
            }
            None => {
                debug!(method, "notification ignored");
                None
            }
        }
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.tools_list_payload()),
            "tools/call" => self.handle_tools_call(params).await,
            "resources/list" => Ok(self.resources_list_payload()),
            "resources/read" => self.handle_resources_read(params),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn initialize_payload(&self) -> Value {
        let mut instructions = String::from(
            "Each tool maps to one ConfigCat Public Management API endpoint. Start with list-organizations or list-products to discover identifiers, then drill down to configs, environments and feature flags.",
        );
        if self.engine.docs().is_some() {
            instructions.push_str(&format!(
                " For SDK integration questions call {} first.",
                docs::DOCS_TOOL_NAME
            ));
        }
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "serverInfo": {
                "name": MCP_SERVER_NAME,
                "version": MCP_SERVER_VERSION
            },
            "instructions": instructions
        })
    }

    fn tools_list_payload(&self) -> Value {
        let tools: Vec<Value> = self
            .engine
            .tools()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let result = self.engine.invoke(name, params.get("arguments")).await;
        Ok(result.to_value())
    }

    fn resources_list_payload(&self) -> Value {
        let mut resources = vec![json!({
            "uri": CATALOG_RESOURCE_URI,
            "name": "ConfigCat API Catalog",
            "description": "Every registered endpoint tool with its method, path template and parameter bindings",
            "mimeType": "application/json"
        })];
        if let Some(sdk_docs) = self.engine.docs() {
            resources.push(json!({
                "uri": SDK_REFERENCE_RESOURCE_URI,
                "name": "ConfigCat SDK Reference",
                "description": format!("SDK Reference section of {}", sdk_docs.source_url),
                "mimeType": "text/markdown"
            }));
        }
        json!({ "resources": resources })
    }

    fn handle_resources_read(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("resources/read params must be an object"))?;
        let uri = params.get("uri").and_then(Value::as_str).ok_or_else(|| {
            RpcError::invalid_params("resources/read requires string field 'uri'")
        })?;

        let (mime_type, text) = match (uri, self.engine.docs()) {
            (CATALOG_RESOURCE_URI, _) => (
                "application/json",
                to_pretty_json(&catalog::catalog_index(self.engine.registry())),
            ),
            (SDK_REFERENCE_RESOURCE_URI, Some(sdk_docs)) => {
                ("text/markdown", sdk_docs.reference.clone())
            }
            _ => {
                return Err(RpcError::invalid_params(format!(
                    "Unknown resource uri '{uri}'"
                )));
            }
        };

        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": mime_type,
                "text": text
            }]
        }))
    }
}

#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
        }
    }

    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {method}"),
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
        }
    }
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, error: RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    })
}

/// Largest `Content-Length` body that is buffered. Bigger bodies are skipped.
const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

enum Incoming {
    Payload(Vec<u8>, Framing),
    /// Input that cannot be answered normally but must not end the session.
    Rejected(RpcError, Framing),
}

/// Reads one message. A line starting with `{` or `[` is a newline-delimited
/// message; a `Name: value` line starts a `Content-Length` header block.
/// Only I/O failures and EOF inside a header block are errors.
async fn read_message<R>(reader: &mut R) -> Result<Option<Incoming>, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut header_error: Option<RpcError> = None;
    let mut in_headers = false;

    loop {
        let mut raw = Vec::new();
        let bytes_read = reader.read_until(b'\n', &mut raw).await?;
        if bytes_read == 0 {
            if !in_headers {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Unexpected EOF while reading MCP headers",
            ));
        }

        let line = raw.trim_ascii_end();
        if !in_headers {
            let start = line.trim_ascii_start();
            if start.is_empty() {
                continue;
            }
            if start.starts_with(b"{") || start.starts_with(b"[") {
                return Ok(Some(Incoming::Payload(start.to_vec(), Framing::Newline)));
            }
            if !std::str::from_utf8(start).is_ok_and(|text| text.contains(':')) {
                return Ok(Some(Incoming::Rejected(
                    RpcError::parse_error("Unrecognized input line"),
                    Framing::Newline,
                )));
            }
            in_headers = true;
        }

        if line.is_empty() {
            break;
        }
        let Ok(header) = std::str::from_utf8(line) else {
            header_error
                .get_or_insert_with(|| RpcError::parse_error("Header line is not valid UTF-8"));
            continue;
        };
        if header.to_ascii_lowercase().starts_with("content-length:") {
            let raw_len = header
                .split_once(':')
                .map(|(_, right)| right.trim())
                .unwrap_or_default();
            match raw_len.parse::<usize>() {
                Ok(parsed) => content_length = Some(parsed),
                Err(_) => {
                    header_error.get_or_insert_with(|| {
                        RpcError::parse_error(format!("Invalid Content-Length header: {raw_len}"))
                    });
                }
            }
        }
    }

    if let Some(error) = header_error {
        return Ok(Some(Incoming::Rejected(error, Framing::ContentLength)));
    }
    let Some(content_length) = content_length else {
        return Ok(Some(Incoming::Rejected(
            RpcError::parse_error("Missing Content-Length header"),
            Framing::ContentLength,
        )));
    };
    if content_length > MAX_MESSAGE_BYTES {
        let mut body = (&mut *reader).take(content_length as u64);
        io::copy(&mut body, &mut io::sink()).await?;
        return Ok(Some(Incoming::Rejected(
            RpcError::invalid_request(format!(
                "Content-Length {content_length} exceeds the {MAX_MESSAGE_BYTES} byte limit"
            )),
            Framing::ContentLength,
        )));
    }

    let mut payload = vec![0_u8; content_length];
    reader.read_exact(&mut payload).await?;
    Ok(Some(Incoming::Payload(payload, Framing::ContentLength)))
}

async fn write_message<W>(writer: &mut W, value: &Value, framing: Framing) -> Result<(), std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to serialize JSON: {e}"),
        )
    })?;
    match framing {
        Framing::ContentLength => {
            let header = format!(
                "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n",
                body.len()
            );
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(&body).await?;
        }
        Framing::Newline => {
            writer.write_all(&body).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use configcat_core::{EndpointDescriptor, HttpMethod, ParameterLocation, Registry, Schema};
    use httpmock::prelude::*;

    use super::*;
    use crate::docs::SdkDocs;

    fn engine(base_url: &str) -> Engine {
        let registry = Registry::new(vec![
            EndpointDescriptor::new(
                "get-product",
                "This endpoint returns the metadata of a Product.",
                HttpMethod::Get,
                "/v1/products/{productId}",
                Schema::object().required("productId", Schema::string()),
            )
            .with_parameter("productId", ParameterLocation::Path),
        ])
        .unwrap();
        let executor = HttpExecutor::new(
            reqwest::Client::new(),
            base_url,
            &basic_auth_header("user", "pass"),
            "ConfigCat MCP/test",
        )
        .unwrap();
        Engine::new(Arc::new(registry), executor, reqwest::Client::new())
    }

    fn server(base_url: &str) -> McpServer {
        McpServer::new(engine(base_url))
    }

    async fn request(server: &McpServer, method: &str, params: Value) -> Value {
        let mut responses = server
            .handle_incoming_message(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": method,
                "params": params
            }))
            .await;
        assert_eq!(responses.len(), 1);
        responses.remove(0)
    }

    #[tokio::test]
    async fn initialize_reports_server_identity() {
        let response = request(&server("http://127.0.0.1:9"), "initialize", json!({})).await;
        let result = &response["result"];
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "ConfigCat MCP");
        assert_eq!(result["serverInfo"]["version"], MCP_SERVER_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_renders_registry() {
        let response = request(&server("http://127.0.0.1:9"), "tools/list", json!({})).await;
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "get-product");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["productId"]));
    }

    #[tokio::test]
    async fn tools_call_returns_content_and_error_flag() {
        let mock_server = MockServer::start();
        mock_server.mock(|when, then| {
            when.method(GET).path("/v1/products/abc-123");
            then.status(200).header("content-type", "text/plain").body("ok");
        });
        let server = server(&mock_server.base_url());

        let ok = request(
            &server,
            "tools/call",
            json!({ "name": "get-product", "arguments": { "productId": "abc-123" } }),
        )
        .await;
        assert_eq!(ok["result"], json!({ "content": [{ "type": "text", "text": "ok" }] }));

        let invalid = request(
            &server,
            "tools/call",
            json!({ "name": "get-product", "arguments": {} }),
        )
        .await;
        assert_eq!(invalid["result"]["isError"], json!(true));
        assert_eq!(
            invalid["result"]["content"][0]["text"],
            "Invalid arguments for tool 'get-product': productId (required): Required"
        );
    }

    #[tokio::test]
    async fn tools_call_without_name_is_invalid_params() {
        let response = request(&server("http://127.0.0.1:9"), "tools/call", json!({})).await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn unknown_method_and_bad_envelope() {
        let srv = server("http://127.0.0.1:9");
        let response = request(&srv, "sampling/createMessage", json!({})).await;
        assert_eq!(response["error"]["code"], -32601);

        let responses = srv
            .handle_incoming_message(json!({ "jsonrpc": "1.0", "id": 4, "method": "ping" }))
            .await;
        assert_eq!(responses[0]["error"]["code"], -32600);
        assert_eq!(responses[0]["id"], 4);

        let responses = srv.handle_incoming_message(json!([])).await;
        assert_eq!(responses[0]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let responses = server("http://127.0.0.1:9")
            .handle_incoming_message(json!({
                "jsonrpc": "2.0",
                "method": "notifications/initialized"
            }))
            .await;
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn batch_answers_requests_only() {
        let responses = server("http://127.0.0.1:9")
            .handle_incoming_message(json!([
                { "jsonrpc": "2.0", "id": 1, "method": "ping" },
                { "jsonrpc": "2.0", "method": "notifications/cancelled" },
                { "jsonrpc": "2.0", "id": 2, "method": "prompts/list" }
            ]))
            .await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"], json!({}));
        assert_eq!(responses[1]["result"], json!({ "prompts": [] }));
    }

    #[tokio::test]
    async fn resources_follow_loaded_docs() {
        let plain = server("http://127.0.0.1:9");
        let listed = request(&plain, "resources/list", json!({})).await;
        assert_eq!(listed["result"]["resources"].as_array().unwrap().len(), 1);

        let catalog = request(&plain, "resources/read", json!({ "uri": CATALOG_RESOURCE_URI })).await;
        let text = catalog["result"]["contents"][0]["text"].as_str().unwrap();
        let index: Value = serde_json::from_str(text).unwrap();
        assert_eq!(index["count"], 1);

        let missing = request(
            &plain,
            "resources/read",
            json!({ "uri": SDK_REFERENCE_RESOURCE_URI }),
        )
        .await;
        assert_eq!(missing["error"]["code"], -32602);

        let with_docs = McpServer::new(engine("http://127.0.0.1:9").with_docs(SdkDocs {
            source_url: docs::DEFAULT_DOCS_URL.to_string(),
            reference: "### SDK Reference\n- [Go](https://x.io/go)".to_string(),
        }));
        let listed = request(&with_docs, "resources/list", json!({})).await;
        assert_eq!(
            listed["result"]["resources"][1]["description"],
            format!("SDK Reference section of {}", docs::DEFAULT_DOCS_URL)
        );

        let sdk = request(
            &with_docs,
            "resources/read",
            json!({ "uri": SDK_REFERENCE_RESOURCE_URI }),
        )
        .await;
        assert_eq!(sdk["result"]["contents"][0]["mimeType"], "text/markdown");
        assert_eq!(
            sdk["result"]["contents"][0]["text"],
            "### SDK Reference\n- [Go](https://x.io/go)"
        );
    }

    #[tokio::test]
    async fn serve_speaks_content_length_framing() {
        let body = r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#;
        let input = format!("Content-Length: {}\r\n\r\n{body}", body.len());
        let mut output = Vec::new();
        server("http://127.0.0.1:9")
            .serve(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let (header, payload) = output.split_once("\r\n\r\n").unwrap();
        assert!(header.starts_with(&format!("Content-Length: {}", payload.len())));
        let response: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(response, json!({ "jsonrpc": "2.0", "id": 7, "result": {} }));
    }

    #[tokio::test]
    async fn serve_answers_newline_delimited_input_in_kind() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{not json}\n",
        );
        let mut output = Vec::new();
        server("http://127.0.0.1:9")
            .serve(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn undecodable_line_gets_parse_error_and_session_continues() {
        let mut input = vec![0xFF_u8, b'\n'];
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n");
        let mut output = Vec::new();
        server("http://127.0.0.1:9")
            .serve(input.as_slice(), &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["code"], -32700);
        assert_eq!(lines[1], json!({ "jsonrpc": "2.0", "id": 3, "result": {} }));
    }

    #[tokio::test]
    async fn bad_content_length_gets_parse_error_and_session_continues() {
        let input = concat!(
            "Content-Length: abc\r\n\r\n",
            "{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"ping\"}\n",
        );
        let mut output = Vec::new();
        server("http://127.0.0.1:9")
            .serve(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let (header, rest) = output.split_once("\r\n\r\n").unwrap();
        let length: usize = header
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("Content-Length: "))
            .unwrap()
            .parse()
            .unwrap();
        let rejected: Value = serde_json::from_str(&rest[..length]).unwrap();
        assert_eq!(rejected["error"]["code"], -32700);
        let ping: Value = serde_json::from_str(rest[length..].trim()).unwrap();
        assert_eq!(ping["id"], 4);
        assert_eq!(ping["result"], json!({}));
    }

    #[tokio::test]
    async fn oversized_content_length_is_rejected_without_allocating() {
        let input = "Content-Length: 18446744073709551615\r\n\r\n{}";
        let mut output = Vec::new();
        server("http://127.0.0.1:9")
            .serve(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let (_, payload) = output.split_once("\r\n\r\n").unwrap();
        let response: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn truncated_headers_are_a_read_error() {
        let mut output = Vec::new();
        let err = server("http://127.0.0.1:9")
            .serve("Content-Length: 10\r\n".as_bytes(), &mut output)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Read(_)));
    }

    #[tokio::test]
    async fn build_engine_requires_credentials() {
        let config = RuntimeConfig::new(DEFAULT_BASE_URL, "", "secret");
        let err = build_engine(&config).await.unwrap_err();
        assert!(matches!(err, StartupError::MissingCredentials));
        assert!(err.to_string().contains("CONFIGCAT_API_USER"));
    }

    #[tokio::test]
    async fn build_engine_loads_catalog_and_docs() {
        let docs_server = MockServer::start();
        let llms = docs_server.mock(|when, then| {
            when.method(GET).path("/docs/llms.txt");
            then.status(200)
                .body("# ConfigCat\n### SDK Reference\n- [JS](https://x.io/js)\n### Next\n");
        });

        let mut config = RuntimeConfig::new(DEFAULT_BASE_URL, "user", "pass");
        config.docs_url = docs_server.url("/docs/llms.txt");
        let engine = build_engine(&config).await.unwrap();
        llms.assert();
        assert_eq!(engine.tools().len(), 83);
        assert_eq!(
            engine.docs().unwrap().reference,
            "### SDK Reference\n- [JS](https://x.io/js)"
        );

        config.fetch_docs = false;
        let offline = build_engine(&config).await.unwrap();
        assert_eq!(offline.tools().len(), 82);
        llms.assert_hits(1);
    }

    #[tokio::test]
    async fn failed_docs_fetch_only_disables_the_tool() {
        let docs_server = MockServer::start();
        docs_server.mock(|when, then| {
            when.method(GET).path("/docs/llms.txt");
            then.status(503);
        });

        let mut config = RuntimeConfig::new(DEFAULT_BASE_URL, "user", "pass");
        config.docs_url = docs_server.url("/docs/llms.txt");
        let engine = build_engine(&config).await.unwrap();
        assert!(engine.docs().is_none());
        assert_eq!(engine.tools().len(), 82);
    }

    #[test]
    fn debug_output_hides_credentials() {
        let config = RuntimeConfig::new(DEFAULT_BASE_URL, "08d86d63-user", "hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("08d86d63-user"));
        assert_eq!(config.user_agent, format!("ConfigCat MCP/{MCP_SERVER_VERSION}"));
    }
}
