// Upstream client implementation
// Thin reqwest wrapper that relays one request and classifies the reply

use reqwest::{
    header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde_json::Value;

use super::{excerpt, is_json_content_type, UpstreamError};

/// Everything the gateway forwards for one inbound request
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Endpoint path relative to the base URL, without leading slash
    pub endpoint: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    pub authorization: Option<HeaderValue>,
    pub body: Option<Value>,
}

/// Well-formed upstream answers
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamReply {
    Json { status: StatusCode, body: Value },
    /// No-content answers (204/205, or a JSON reply with a zero-length body)
    Empty { status: StatusCode },
}

impl UpstreamReply {
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamReply::Json { status, .. } => *status,
            UpstreamReply::Empty { status } => *status,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            UpstreamReply::Json { body, .. } => Some(body),
            UpstreamReply::Empty { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let http_client = Client::builder()
            .user_agent(concat!("formation-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(http_client, base_url))
    }

    pub fn with_client(http_client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http_client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/{endpoint}{?query}`, with the endpoint and query kept as given
    pub fn endpoint_url(&self, endpoint: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Relay a single request. Transport failures and non-JSON replies are
    /// errors; upstream 4xx/5xx with a JSON body are ordinary replies.
    pub async fn forward(&self, request: ProxyRequest) -> Result<UpstreamReply, UpstreamError> {
        let target = self.endpoint_url(&request.endpoint, request.query.as_deref());
        let url = url::Url::parse(&target).map_err(|_| UpstreamError::InvalidUrl(target.clone()))?;

        tracing::debug!("Forwarding {} {}", request.method, url);

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(authorization) = request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let carries_body = !matches!(request.method, Method::GET | Method::HEAD);
        if let (true, Some(body)) = (carries_body, request.body.as_ref()) {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        classify(status, content_type, &bytes)
    }

    /// Plain GET of the base URL, used by operator tooling
    pub async fn ping(&self) -> Result<(StatusCode, Option<String>), UpstreamError> {
        let response = self
            .http_client
            .get(&self.base_url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok((response.status(), content_type))
    }
}

fn classify(
    status: StatusCode,
    content_type: Option<String>,
    bytes: &[u8],
) -> Result<UpstreamReply, UpstreamError> {
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return Ok(UpstreamReply::Empty { status });
    }

    let is_json = content_type.as_deref().map(is_json_content_type).unwrap_or(false);
    if !is_json {
        return Err(UpstreamError::NotJson {
            status: status.as_u16(),
            content_type,
            excerpt: excerpt(bytes),
        });
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpstreamReply::Empty { status });
    }

    match serde_json::from_slice(bytes) {
        Ok(body) => Ok(UpstreamReply::Json { status, body }),
        Err(source) => Err(UpstreamError::MalformedJson {
            status: status.as_u16(),
            excerpt: excerpt(bytes),
            source,
        }),
    }
}
