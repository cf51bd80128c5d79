// handlers/proxy.rs - catch-all API gateway handler
//
// Every method under the API prefix lands here and is relayed to the
// upstream service. Authorization is left to the upstream.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, Uri},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::Value;

use crate::error::ApiError;
use crate::server::AppState;
use crate::session::{self, SessionEffect};
use crate::upstream::{ProxyRequest, UpstreamReply};

/// `{api_prefix}/*rest` - relay to `{base_url}/{rest}{?query}`
///
/// The endpoint and query are taken from the raw request URI rather than the
/// decoded path parameter, so percent-escapes reach the upstream unchanged.
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    jar: CookieJar,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let endpoint = upstream_endpoint(uri.path(), &state.config.routes.api_prefix);

    // Oversized or unreadable bodies still get the JSON error envelope
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("Rejecting {} /{}: {}", method, endpoint, rejection.body_text());
            return ApiError::body_rejected(rejection.status(), rejection.body_text()).into_response();
        }
    };

    let body = match parse_body(&method, &body) {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("Rejecting {} /{}: {}", method, endpoint, e);
            return e.into_response();
        }
    };

    let authorization = session::outbound_authorization(
        headers.get(AUTHORIZATION),
        session::session_token(&jar, &state.config.session),
    );

    let request = ProxyRequest {
        method: method.clone(),
        endpoint: endpoint.clone(),
        query: uri.query().map(str::to_string),
        authorization,
        body,
    };

    match state.upstream.forward(request).await {
        Ok(reply) => {
            let status = reply.status();
            if state.config.api.enable_request_logging {
                tracing::info!("{} /{} -> {}", method, endpoint, status);
            }

            let effect = SessionEffect::for_reply(&endpoint, reply.body(), &state.config.routes);
            let jar = effect.apply(jar, &state.config.session);

            match reply {
                UpstreamReply::Json { status, body } => (status, jar, Json(body)).into_response(),
                UpstreamReply::Empty { status } => (status, jar).into_response(),
            }
        }
        Err(e) => {
            let error = ApiError::from(e);
            tracing::warn!("{} /{} failed: {}", method, endpoint, error);

            // A logout still ends the browser session when the upstream misbehaves
            let jar = SessionEffect::for_reply(&endpoint, None, &state.config.routes)
                .apply(jar, &state.config.session);

            (jar, error).into_response()
        }
    }
}

/// Strip the API prefix from a request path, leaving the upstream endpoint
pub fn upstream_endpoint(path: &str, api_prefix: &str) -> String {
    path.strip_prefix(api_prefix)
        .unwrap_or(path)
        .trim_start_matches('/')
        .to_string()
}

/// GET and HEAD never forward a body. For other methods an empty body means
/// "no body"; anything else must be valid JSON.
pub fn parse_body(method: &Method, raw: &[u8]) -> Result<Option<Value>, ApiError> {
    if matches!(*method, Method::GET | Method::HEAD) {
        return Ok(None);
    }

    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(raw)
        .map(Some)
        .map_err(|e| ApiError::invalid_json(format!("Request body is not valid JSON: {}", e)))
}
