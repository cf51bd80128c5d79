#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Router,
};
use formation_gateway::config::AppConfig;
use formation_gateway::upstream::UpstreamClient;
use formation_gateway::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

/// One request as the fake upstream saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

type Log = Arc<Mutex<Vec<Recorded>>>;

/// Loopback stand-in for the upstream REST service
pub struct FakeUpstream {
    pub base_url: String,
    log: Log,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new().fallback(respond).with_state(log.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake upstream");
        let addr = listener.local_addr().expect("fake upstream address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            log,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("upstream received no request")
    }
}

async fn respond(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let recorded = Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        accept: header_str(header::ACCEPT),
        body: body.to_vec(),
    };
    log.lock().unwrap().push(recorded.clone());

    match uri.path() {
        "/auth/login" => Json(json!({
            "access_token": "tok-123",
            "token_type": "bearer",
            "user": { "email": "owner@example.com" }
        }))
        .into_response(),
        "/auth/logout" => Json(json!({ "message": "Logged out" })).into_response(),
        "/auth/logout-with-token" => Json(json!({ "access_token": "should-not-stick" })).into_response(),
        "/auth/bad-credentials" => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect email or password" })),
        )
            .into_response(),
        "/missing" => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))).into_response(),
        "/created" => (StatusCode::CREATED, Json(json!({ "id": 7 }))).into_response(),
        "/empty" => StatusCode::NO_CONTENT.into_response(),
        "/html" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            format!("<!DOCTYPE html><html><body>{}</body></html>", "x".repeat(500)),
        )
            .into_response(),
        "/html-gateway-error" => (
            StatusCode::BAD_GATEWAY,
            [(header::CONTENT_TYPE, "text/html")],
            "<html>Bad Gateway</html>",
        )
            .into_response(),
        "/broken-json" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{\"unterminated\": ",
        )
            .into_response(),
        _ => Json(json!({
            "method": recorded.method.as_str(),
            "path": recorded.path,
            "query": recorded.query,
            "authorization": recorded.authorization,
            "body": recorded.body_json(),
        }))
        .into_response(),
    }
}

/// Gateway app wired to the given upstream base URL
pub fn build_test_app(base_url: &str) -> Router {
    build_test_app_with_config(AppConfig::for_upstream(base_url))
}

pub fn build_test_app_with_config(config: AppConfig) -> Router {
    // Loopback calls must not be routed through an HTTP proxy from the environment
    let http_client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("failed to build HTTP client");
    let upstream = UpstreamClient::with_client(http_client, config.upstream.base_url.clone());

    formation_gateway::app(AppState::with_upstream(config, upstream))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
