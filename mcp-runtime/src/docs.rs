//! SDK documentation helper: slices the SDK Reference out of `llms.txt` at
//! startup and exposes a tool that fetches individual documentation pages.

use std::sync::LazyLock;

use configcat_core::{Schema, StringFormat};
use regex::Regex;
use tracing::debug;

pub const DOCS_TOOL_NAME: &str = "update-sdk-documentation";
pub const DEFAULT_DOCS_URL: &str = "https://configcat.com/docs/llms.txt";
pub const SDK_REFERENCE_HEADER: &str = "### SDK Reference";

static NEXT_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n###\s+").expect("valid heading regex"));

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("Failed to fetch {url} - HTTP {status}: {reason}")]
    Http {
        url: String,
        status: u16,
        reason: String,
    },
    #[error("Failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to extract SDK Reference section from {url}")]
    MissingSection { url: String },
}

/// The SDK Reference section loaded at startup. Its presence is what enables
/// the documentation tool and resource.
#[derive(Debug, Clone)]
pub struct SdkDocs {
    pub source_url: String,
    pub reference: String,
}

impl SdkDocs {
    pub fn tool_description(&self) -> String {
        format!(
            "If the user asks for coding related to a feature flag (such as integrating the ConfigCat SDK, adding a feature flag, or removing a feature flag), \
always call the tool \"{DOCS_TOOL_NAME}\" first to download the latest ConfigCat SDK documentation.\n\n\
1. Analyze the SDK URLs listed in the following SDK Reference list.\n\
2. Then call the tool \"{DOCS_TOOL_NAME}\" with specific URL from the SDK Reference list to fetch relevant documentation page.\n\n{}",
            self.reference
        )
    }
}

pub fn input_schema() -> Schema {
    Schema::object().required(
        "url",
        Schema::string()
            .format(StringFormat::Uri)
            .describe("The URL to fetch SDK documentation from."),
    )
}

/// Text from `header` up to the next `###` heading (or the end), trimmed.
/// Empty when `header` does not occur.
pub fn extract_markdown_section(content: &str, header: &str) -> String {
    let Some(start) = content.find(header) else {
        return String::new();
    };
    let rest = &content[start + header.len()..];
    let end = NEXT_HEADING
        .find(rest)
        .map_or(content.len(), |m| start + header.len() + m.start());
    content[start..end].trim().to_string()
}

pub async fn fetch_text(http: &reqwest::Client, url: &str) -> Result<String, DocsError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|source| DocsError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DocsError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let text = response.text().await.map_err(|source| DocsError::Network {
        url: url.to_string(),
        source,
    })?;
    debug!(url, chars = text.chars().count(), "fetched documentation");
    Ok(text)
}

pub async fn load_sdk_docs(http: &reqwest::Client, url: &str) -> Result<SdkDocs, DocsError> {
    let content = fetch_text(http, url).await?;
    let reference = extract_markdown_section(&content, SDK_REFERENCE_HEADER);
    if reference.is_empty() {
        return Err(DocsError::MissingSection {
            url: url.to_string(),
        });
    }
    Ok(SdkDocs {
        source_url: url.to_string(),
        reference,
    })
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    const LLMS_TXT: &str = "# ConfigCat\n\n### Getting Started\nIntro.\n\n### SDK Reference\n- [JS](https://configcat.com/docs/sdk-reference/js)\n- [Go](https://configcat.com/docs/sdk-reference/go)\n\n###   Advanced\nMore.\n";

    #[test]
    fn extracts_until_next_heading() {
        assert_eq!(
            extract_markdown_section(LLMS_TXT, SDK_REFERENCE_HEADER),
            "### SDK Reference\n- [JS](https://configcat.com/docs/sdk-reference/js)\n- [Go](https://configcat.com/docs/sdk-reference/go)"
        );
    }

    #[test]
    fn extracts_to_end_when_last_section() {
        let content = "intro\n### SDK Reference\n- one\n";
        assert_eq!(
            extract_markdown_section(content, SDK_REFERENCE_HEADER),
            "### SDK Reference\n- one"
        );
    }

    #[test]
    fn missing_header_is_empty() {
        assert_eq!(extract_markdown_section("# nothing here", SDK_REFERENCE_HEADER), "");
    }

    #[test]
    fn tool_description_embeds_reference() {
        let docs = SdkDocs {
            source_url: DEFAULT_DOCS_URL.to_string(),
            reference: "### SDK Reference\n- [JS](https://x)".to_string(),
        };
        let description = docs.tool_description();
        assert!(description.contains("call the tool \"update-sdk-documentation\" first"));
        assert!(description.ends_with("### SDK Reference\n- [JS](https://x)"));
    }

    #[test]
    fn input_schema_requires_a_url() {
        let schema = input_schema();
        assert!(schema.validate(&json!({ "url": "https://configcat.com/docs" })).is_ok());
        assert!(schema.validate(&json!({ "url": "docs" })).is_err());
        assert!(schema.validate(&json!({})).is_err());
    }

    #[tokio::test]
    async fn loads_sdk_reference_without_credentials() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/docs/llms.txt");
            then.status(200).body(LLMS_TXT);
        });

        let url = server.url("/docs/llms.txt");
        let docs = load_sdk_docs(&reqwest::Client::new(), &url).await.unwrap();
        mock.assert();
        assert!(docs.reference.starts_with(SDK_REFERENCE_HEADER));
        assert!(!docs.reference.contains("Advanced"));
    }

    #[tokio::test]
    async fn failed_fetch_reports_status_and_reason() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/docs/missing");
            then.status(404);
        });

        let url = server.url("/docs/missing");
        let err = fetch_text(&reqwest::Client::new(), &url).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Failed to fetch {url} - HTTP 404: Not Found"));
    }

    #[tokio::test]
    async fn document_without_reference_section_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/llms.txt");
            then.status(200).body("# ConfigCat\n### Other\n");
        });

        let err = load_sdk_docs(&reqwest::Client::new(), &server.url("/llms.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsError::MissingSection { .. }));
    }
}
