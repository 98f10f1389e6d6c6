//! Turns executor outcomes and pipeline failures into caller-facing results.

use serde_json::{Value, json};

use crate::engine::InvocationError;
use crate::executor::HttpResponse;

pub const CREDENTIALS_GUIDANCE: &str = "Invalid API credentials. Please check your CONFIGCAT_API_USER and CONFIGCAT_API_PASS environment variables. You can create your credentials on the Public API credentials management page: https://app.configcat.com/my-account/public-api-credentials";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// MCP `tools/call` result payload.
    pub fn to_value(&self) -> Value {
        let mut payload = json!({
            "content": [{ "type": "text", "text": self.text }]
        });
        if self.is_error {
            payload["isError"] = Value::Bool(true);
        }
        payload
    }
}

pub fn render_response(response: &HttpResponse) -> ToolResult {
    let is_json = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json"));
    let parsed = is_json
        .then(|| serde_json::from_str::<Value>(&response.body).ok())
        .flatten();
    if let Some(parsed) = parsed {
        let pretty = serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| response.body.clone());
        return ToolResult::success(format!(
            "API Response (Status: {}):\n{pretty}",
            response.status
        ));
    }

    if response.body.is_empty() {
        ToolResult::success(format!("(Status: {} - No body content)", response.status))
    } else {
        ToolResult::success(response.body.clone())
    }
}

pub fn translate_error(err: &InvocationError) -> ToolResult {
    match err {
        InvocationError::Validation(e) => ToolResult::error(e.to_string()),
        InvocationError::Binding(e) => ToolResult::error(e.to_string()),
        InvocationError::Transport(e) if e.status() == Some(401) => {
            ToolResult::error(CREDENTIALS_GUIDANCE)
        }
        InvocationError::Transport(e) => ToolResult::error(format!("Error: {e}")),
        InvocationError::Docs(e) => ToolResult::error(format!("Error: {e}")),
        InvocationError::UnknownTool(name) => {
            ToolResult::error(format!("Error: Unknown tool requested: {name}"))
        }
        InvocationError::Internal(message) => {
            ToolResult::error(format!("Internal error: {message}"))
        }
    }
}
