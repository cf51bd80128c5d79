// handlers/system.rs - endpoints the gateway answers itself

use axum::{extract::State, http::Uri};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::server::AppState;

/// GET / - service descriptor
pub async fn root(State(state): State<AppState>) -> ApiResponse<Value> {
    let routes = &state.config.routes;

    ApiResponse::success(json!({
        "name": "formation-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Session-aware API gateway for the LLC formation dashboard",
        "endpoints": {
            "api": format!("{}/* (proxied to the upstream API)", routes.api_prefix),
            "health": "/health (public)",
            "admin": format!("{}/* (session cookie required)", routes.admin_prefix),
            "user": format!("{}/* (session cookie required)", routes.user_prefix),
        }
    }))
}

/// GET /health - local liveness. Does not call the upstream.
pub async fn health(State(state): State<AppState>) -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "environment": state.config.environment,
        "upstream": state.upstream.base_url(),
    }))
}

/// Pages are rendered elsewhere; anything that passes the guard and is not
/// served by this process ends here.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
