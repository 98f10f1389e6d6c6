use std::fmt;

use serde::Serialize;

/// Machine-readable kind of a single schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Required,
    InvalidType,
    TooSmall,
    TooBig,
    InvalidEnumValue,
    InvalidString,
    InvalidUnion,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::Required => "required",
            IssueKind::InvalidType => "invalid_type",
            IssueKind::TooSmall => "too_small",
            IssueKind::TooBig => "too_big",
            IssueKind::InvalidEnumValue => "invalid_enum_value",
            IssueKind::InvalidString => "invalid_string",
            IssueKind::InvalidUnion => "invalid_union",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated constraint, located by its dotted field path
/// (`requestBody.name`, `requestBody.emails.2`). The root is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: String,
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.kind, self.message)
    }
}

/// Caller-supplied arguments did not conform to a tool's input schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid arguments for tool '{tool}': {}", join_issues(.issues))]
pub struct ValidationError {
    pub tool: String,
    pub issues: Vec<Issue>,
}

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(Issue::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// A `{placeholder}` survived substitution; the request is never sent.
    #[error("Failed to resolve path parameters: {path}")]
    UnresolvedPath { path: String },
}

/// A JSON-Schema document could not be converted into a native [`crate::schema::Schema`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported schema at '{pointer}': {reason}")]
pub struct SchemaError {
    pub pointer: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(pointer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate tool name '{0}'")]
    DuplicateName(String),
    #[error("tool '{tool}': placeholder '{{{placeholder}}}' has no path binding")]
    UnboundPlaceholder { tool: String, placeholder: String },
    #[error("tool '{tool}': path binding '{name}' has no placeholder in '{path_template}'")]
    OrphanPathBinding {
        tool: String,
        name: String,
        path_template: String,
    },
    #[error("tool '{tool}': parameter '{name}' is bound more than once")]
    DuplicateBinding { tool: String, name: String },
    #[error("tool '{tool}': 'requestBody' is reserved and cannot be bound as a parameter")]
    ReservedBinding { tool: String },
    #[error("tool '{tool}': {source}")]
    Schema {
        tool: String,
        #[source]
        source: SchemaError,
    },
    #[error("invalid endpoint catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_message_lists_every_issue_with_tool_prefix() {
        let err = ValidationError {
            tool: "create-tag".to_string(),
            issues: vec![
                Issue::new("requestBody.name", IssueKind::Required, "Required"),
                Issue::new(
                    "productId",
                    IssueKind::InvalidString,
                    "Invalid uuid",
                ),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Invalid arguments for tool 'create-tag': requestBody.name (required): Required, productId (invalid_string): Invalid uuid"
        );
    }

    #[test]
    fn unresolved_path_message_names_the_template() {
        let err = BindingError::UnresolvedPath {
            path: "/v1/configs/{configId}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to resolve path parameters: /v1/configs/{configId}"
        );
    }
}
