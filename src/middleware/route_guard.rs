use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::config::RouteConfig;
use crate::server::AppState;
use crate::session;

const STATIC_EXTENSIONS: &[&str] = &[
    "css", "js", "map", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf",
    "txt", "xml",
];

/// Outcome of checking one path against the protected prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Path-prefix access rules. Only checks that a session cookie is present;
/// whether the token is still valid is for the upstream to decide.
#[derive(Debug, Clone, Copy)]
pub struct RouteGuard<'a> {
    routes: &'a RouteConfig,
}

impl<'a> RouteGuard<'a> {
    pub fn new(routes: &'a RouteConfig) -> Self {
        Self { routes }
    }

    /// Whether the guard applies at all. API calls, framework internals and
    /// static files bypass it.
    pub fn is_guarded(&self, path: &str) -> bool {
        if has_path_prefix(path, &self.routes.api_prefix) {
            return false;
        }

        if self
            .routes
            .static_prefixes
            .iter()
            .any(|prefix| has_path_prefix(path, prefix))
        {
            return false;
        }

        if path == "/favicon.ico" {
            return false;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        match last_segment.rsplit_once('.') {
            Some((_, ext)) => !STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
            None => true,
        }
    }

    pub fn decide(&self, path: &str, session_token: Option<&str>) -> GuardDecision {
        let has_session = session_token.map(|t| !t.is_empty()).unwrap_or(false);

        if path.starts_with(&self.routes.admin_prefix) && !self.is_admin_login(path) {
            if has_session {
                return GuardDecision::Allow;
            }
            return GuardDecision::Redirect(self.routes.admin_login_path.clone());
        }

        if path.starts_with(&self.routes.user_prefix) {
            if has_session {
                return GuardDecision::Allow;
            }
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("redirect", path)
                .finish();
            return GuardDecision::Redirect(format!("{}?{}", self.routes.login_path, query));
        }

        GuardDecision::Allow
    }

    fn is_admin_login(&self, path: &str) -> bool {
        path.trim_end_matches('/') == self.routes.admin_login_path.trim_end_matches('/')
    }
}

/// `prefix` matched on whole segments: `/api` covers `/api` and `/api/x`
/// but not `/apiary`
fn has_path_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Redirects browsers without a session away from the admin and user areas
pub async fn route_guard_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let guard = RouteGuard::new(&state.config.routes);

    if !guard.is_guarded(&path) {
        tracing::debug!("route_guard: {} bypasses the guard", path);
        return next.run(request).await;
    }

    match guard.decide(&path, session::session_token(&jar, &state.config.session)) {
        GuardDecision::Allow => {
            tracing::debug!("route_guard: allowing {}", path);
            next.run(request).await
        }
        GuardDecision::Redirect(location) => {
            tracing::info!("route_guard: no session for {}, redirecting to {}", path, location);
            Redirect::temporary(&location).into_response()
        }
    }
}
