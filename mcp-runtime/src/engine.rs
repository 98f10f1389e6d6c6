//! The invocation pipeline: lookup, validate, bind, execute, normalize.

use std::sync::Arc;

use configcat_core::{
    BindingError, EndpointDescriptor, Registry, Schema, ValidationError, bind, validate_arguments,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::docs::{self, DocsError, SdkDocs};
use crate::executor::{HttpExecutor, TransportError};
use crate::normalize::{ToolResult, render_response, translate_error};

#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Docs(#[from] DocsError),
    #[error("{0}")]
    Internal(String),
}

/// A tool as advertised to the caller.
#[derive(Debug, Clone)]
pub struct ToolListing {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Stateless between calls: everything it holds is read-only after startup,
/// so one engine can serve any number of concurrent invocations.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    executor: HttpExecutor,
    docs_http: reqwest::Client,
    docs: Option<Arc<SdkDocs>>,
    docs_schema: Schema,
}

impl Engine {
    pub fn new(registry: Arc<Registry>, executor: HttpExecutor, docs_http: reqwest::Client) -> Self {
        Self {
            registry,
            executor,
            docs_http,
            docs: None,
            docs_schema: docs::input_schema(),
        }
    }

    pub fn with_docs(mut self, docs: SdkDocs) -> Self {
        self.docs = Some(Arc::new(docs));
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn docs(&self) -> Option<&SdkDocs> {
        self.docs.as_deref()
    }

    pub fn tools(&self) -> Vec<ToolListing> {
        let mut tools: Vec<ToolListing> = self.registry.iter().map(listing).collect();
        if let Some(docs) = &self.docs {
            tools.push(ToolListing {
                name: docs::DOCS_TOOL_NAME.to_string(),
                description: docs.tool_description(),
                input_schema: self.docs_schema.to_json_schema(),
            });
        }
        tools
    }

    /// Runs one invocation. Never fails: every error is folded into the
    /// returned [`ToolResult`].
    pub async fn invoke(&self, name: &str, arguments: Option<&Value>) -> ToolResult {
        match self.try_invoke(name, arguments).await {
            Ok(result) => result,
            Err(err) => {
                warn!(tool = name, error = %err, "tool invocation failed");
                translate_error(&err)
            }
        }
    }

    async fn try_invoke(
        &self,
        name: &str,
        arguments: Option<&Value>,
    ) -> Result<ToolResult, InvocationError> {
        if name == docs::DOCS_TOOL_NAME && self.docs.is_some() {
            return self.fetch_documentation(arguments).await;
        }

        let descriptor = self
            .registry
            .lookup(name)
            .ok_or_else(|| InvocationError::UnknownTool(name.to_string()))?;
        let args = validate_arguments(name, &descriptor.input_schema, arguments)?;
        let request = bind(descriptor, &args)?;

        info!(
            tool = name,
            method = %request.method,
            path = %request.path,
            "executing tool"
        );
        let response = self.executor.execute(&request).await?;
        Ok(render_response(&response))
    }

    async fn fetch_documentation(
        &self,
        arguments: Option<&Value>,
    ) -> Result<ToolResult, InvocationError> {
        let args = validate_arguments(docs::DOCS_TOOL_NAME, &self.docs_schema, arguments)?;
        let url = args
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| InvocationError::Internal("validated 'url' is not a string".to_string()))?;

        info!(tool = docs::DOCS_TOOL_NAME, url, "fetching documentation");
        let text = docs::fetch_text(&self.docs_http, url).await?;
        Ok(ToolResult::success(text))
    }
}

fn listing(descriptor: &EndpointDescriptor) -> ToolListing {
    ToolListing {
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        input_schema: descriptor.input_schema.to_json_schema(),
    }
}
