// Upstream REST service client
//
// One-shot relay calls against the fixed base URL. No retries, no caching.

pub mod client;

pub use client::{ProxyRequest, UpstreamClient, UpstreamReply};

use thiserror::Error;

/// Maximum number of characters of a bad upstream body echoed back for diagnostics
pub const DEBUG_EXCERPT_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{}", error_chain(.0))]
    Transport(#[from] reqwest::Error),

    #[error("upstream responded with status {status} and non-JSON content type {content_type:?}")]
    NotJson {
        status: u16,
        content_type: Option<String>,
        excerpt: String,
    },

    #[error("upstream responded with status {status} and an unparseable JSON body: {source}")]
    MalformedJson {
        status: u16,
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),
}

/// Flatten an error and its sources into one line, so "connection refused"
/// style root causes survive into the response payload
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// First `DEBUG_EXCERPT_CHARS` characters of a raw body, lossily decoded
pub fn excerpt(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(DEBUG_EXCERPT_CHARS)
        .collect()
}

/// True for `application/json` and structured `+json` media types
pub fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("Application/JSON"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html; charset=utf-8"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type(""));
    }

    #[test]
    fn excerpt_is_bounded_by_characters() {
        let body = "é".repeat(500);
        let cut = excerpt(body.as_bytes());
        assert_eq!(cut.chars().count(), DEBUG_EXCERPT_CHARS);

        assert_eq!(excerpt(b"<html>short</html>"), "<html>short</html>");
    }

    #[test]
    fn error_chain_includes_sources() {
        #[derive(Debug, Error)]
        #[error("outer")]
        struct Outer(#[source] std::io::Error);

        let err = Outer(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"));
        assert_eq!(error_chain(&err), "outer: connection refused");
    }
}
