//! Session cookie handling.
//!
//! The cookie is the only client-side state the gateway manages. It carries
//! the upstream's bearer token verbatim; nothing is stored server-side.

use axum::http::HeaderValue;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::Value;

use crate::config::{RouteConfig, SessionConfig};

/// What a proxied call does to the browser's session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Issue(String),
    Clear,
    Keep,
}

impl SessionEffect {
    /// Logout endpoints always clear; otherwise a top-level `access_token`
    /// string in the relayed body issues a new cookie.
    pub fn for_reply(endpoint: &str, body: Option<&Value>, routes: &RouteConfig) -> Self {
        if is_logout_endpoint(endpoint, &routes.logout_endpoints) {
            return SessionEffect::Clear;
        }

        match body.and_then(access_token) {
            Some(token) => SessionEffect::Issue(token.to_string()),
            None => SessionEffect::Keep,
        }
    }

    pub fn apply(self, jar: CookieJar, session: &SessionConfig) -> CookieJar {
        match self {
            SessionEffect::Issue(token) => {
                tracing::debug!("Issuing {} cookie", session.cookie_name);
                jar.add(session_cookie(&token, session))
            }
            SessionEffect::Clear => {
                tracing::debug!("Clearing {} cookie", session.cookie_name);
                jar.add(clear_session_cookie(session))
            }
            SessionEffect::Keep => jar,
        }
    }
}

/// Build the httpOnly session cookie carrying the bearer token
pub fn session_cookie(token: &str, session: &SessionConfig) -> Cookie<'static> {
    Cookie::build((session.cookie_name.clone(), token.to_string()))
        .http_only(true)
        .secure(session.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(session.max_age_secs))
        .build()
}

/// Expired cookie that makes the browser drop the session
pub fn clear_session_cookie(session: &SessionConfig) -> Cookie<'static> {
    Cookie::build((session.cookie_name.clone(), String::new()))
        .http_only(true)
        .secure(session.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Session token from the jar; an empty value counts as no session
pub fn session_token<'a>(jar: &'a CookieJar, session: &SessionConfig) -> Option<&'a str> {
    jar.get(&session.cookie_name)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}

/// `Authorization` value to send upstream. A non-blank inbound header wins;
/// the cookie is consulted when the header is missing or blank.
pub fn outbound_authorization(
    explicit: Option<&HeaderValue>,
    cookie_token: Option<&str>,
) -> Option<HeaderValue> {
    let explicit = explicit.filter(|header| !header.as_bytes().iter().all(u8::is_ascii_whitespace));
    if let Some(header) = explicit {
        return Some(header.clone());
    }

    let token = cookie_token?;
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Session cookie holds characters not allowed in a header, not forwarding it");
            None
        }
    }
}

/// Top-level `access_token` string of an upstream body
pub fn access_token(body: &Value) -> Option<&str> {
    body.get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
}

pub fn is_logout_endpoint(endpoint: &str, logout_endpoints: &[String]) -> bool {
    let endpoint = endpoint.trim_matches('/');
    logout_endpoints
        .iter()
        .any(|candidate| candidate.trim_matches('/') == endpoint)
}
