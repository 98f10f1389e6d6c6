use std::fmt;

use configcat_core::{BoundRequest, HttpMethod};
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::{Value, json};
use tracing::debug;

const RATE_LIMIT_REMAINING: &str = "X-Rate-Limit-Remaining";
const RATE_LIMIT_RESET: &str = "X-Rate-Limit-Reset";

/// Rate-limit headers echoed back on a failed call. Missing headers render as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: Option<String>,
    pub reset: Option<String>,
}

impl RateLimit {
    fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            remaining: read(RATE_LIMIT_REMAINING),
            reset: read(RATE_LIMIT_RESET),
        }
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            json!({ "remaining": self.remaining, "reset": self.reset })
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status} {reason} for {url} - {body} - rate: {rate}")]
    Status {
        status: u16,
        reason: String,
        url: String,
        body: String,
        rate: RateLimit,
    },
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid request URL '{0}'")]
    InvalidUrl(String),
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Sends bound requests to the remote API with a fixed set of headers.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http: reqwest::Client,
    base_url: String,
    fixed_headers: HeaderMap,
}

impl HttpExecutor {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        auth_header: &str,
        user_agent: &str,
    ) -> Result<Self, TransportError> {
        let value = |raw: &str, name: &str| {
            HeaderValue::from_str(raw).map_err(|_| TransportError::InvalidHeader(name.to_string()))
        };
        let mut auth = value(auth_header, AUTHORIZATION.as_str())?;
        auth.set_sensitive(true);

        let mut fixed_headers = HeaderMap::new();
        fixed_headers.insert(AUTHORIZATION, auth);
        fixed_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        fixed_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        fixed_headers.insert(USER_AGENT, value(user_agent, USER_AGENT.as_str())?);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            fixed_headers,
        })
    }

    pub fn url_for(&self, request: &BoundRequest) -> Result<reqwest::Url, TransportError> {
        let raw = format!("{}{}", self.base_url, request.path);
        let mut url = reqwest::Url::parse(&raw).map_err(|_| TransportError::InvalidUrl(raw))?;
        if !request.query.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (key, value) in &request.query {
                for text in query_values(value) {
                    qp.append_pair(key, &text);
                }
            }
        }
        Ok(url)
    }

    pub async fn execute(&self, request: &BoundRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(request)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }
        // Fixed headers go last so a per-call header can never replace them.
        for (name, value) in &self.fixed_headers {
            headers.insert(name.clone(), value.clone());
        }

        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), url.clone())
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %url, "sending request");
        let response = builder.send().await.map_err(|source| TransportError::Network {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let rate = RateLimit::from_headers(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                url: url.to_string(),
                body,
                rate,
            });
        }

        let body = response.text().await.map_err(|source| TransportError::Body {
            url: url.to_string(),
            source,
        })?;

        Ok(HttpResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Scalars become their text, arrays repeat the key per element, objects are
/// sent as JSON text.
fn query_values(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(query_values).collect(),
        other => vec![other.to_string()],
    }
}
