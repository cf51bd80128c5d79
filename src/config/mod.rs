use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://api.formation.example.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
    pub routes: RouteConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL every proxied endpoint is appended to, without trailing slash
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub api_prefix: String,
    pub admin_prefix: String,
    pub admin_login_path: String,
    pub user_prefix: String,
    pub login_path: String,
    pub static_prefixes: Vec<String>,
    /// Upstream endpoints (relative to the base URL) that end the session
    pub logout_endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_permissive: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_BASE_URL must be an absolute http(s) URL, got '{0}'")]
    InvalidUpstreamUrl(String),
}

impl Environment {
    /// Reads `APP_ENV` only, so logging can be set up before the full config loads
    pub fn from_env() -> Self {
        Self::parse(env::var("APP_ENV").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. An explicitly set
    /// but invalid `API_BASE_URL` is an error; only an unset one falls back
    /// to the default upstream.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(lookup("APP_ENV").as_deref());

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Upstream
        if let Some(v) = lookup("API_BASE_URL") {
            self.upstream.base_url =
                normalize_base_url(&v).ok_or_else(|| ConfigError::InvalidUpstreamUrl(v.clone()))?;
        }

        // Server
        if let Some(v) = lookup("GATEWAY_HOST") {
            self.server.host = v;
        }
        if let Some(port) = lookup("GATEWAY_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Session cookie
        if let Some(v) = lookup("SESSION_COOKIE_SECURE") {
            self.session.secure = v.parse().unwrap_or(self.session.secure);
        }
        if let Some(v) = lookup("SESSION_MAX_AGE_SECS") {
            self.session.max_age_secs = v.parse().unwrap_or(self.session.max_age_secs);
        }

        // Routes
        if let Some(v) = lookup("ROUTE_API_PREFIX") {
            self.routes.api_prefix = normalize_prefix(&v);
        }
        if let Some(v) = lookup("ROUTE_ADMIN_PREFIX") {
            self.routes.admin_prefix = normalize_prefix(&v);
        }
        if let Some(v) = lookup("ROUTE_ADMIN_LOGIN") {
            self.routes.admin_login_path = normalize_prefix(&v);
        }
        if let Some(v) = lookup("ROUTE_USER_PREFIX") {
            self.routes.user_prefix = normalize_prefix(&v);
        }
        if let Some(v) = lookup("ROUTE_LOGIN_PATH") {
            self.routes.login_path = normalize_prefix(&v);
        }
        if let Some(v) = lookup("GATEWAY_LOGOUT_ENDPOINTS") {
            self.routes.logout_endpoints = split_list(&v);
        }

        // API
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
            self.security.cors_permissive = false;
        }

        Ok(self)
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn base(environment: Environment) -> Self {
        Self {
            environment,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            upstream: UpstreamConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
            },
            session: SessionConfig {
                cookie_name: "session_token".to_string(),
                secure: false,
                max_age_secs: 60 * 60 * 24 * 7, // 7 days
            },
            routes: RouteConfig {
                api_prefix: "/api".to_string(),
                admin_prefix: "/admin".to_string(),
                admin_login_path: "/admin/login".to_string(),
                user_prefix: "/dashboard".to_string(),
                login_path: "/login".to_string(),
                static_prefixes: vec![
                    "/_next".to_string(),
                    "/static".to_string(),
                    "/assets".to_string(),
                ],
                logout_endpoints: vec!["auth/logout".to_string()],
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_permissive: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
        }
    }

    pub fn development() -> Self {
        Self::base(Environment::Development)
    }

    pub fn staging() -> Self {
        let mut config = Self::base(Environment::Staging);
        config.session.secure = true;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.security.cors_permissive = false;
        config.security.cors_origins = vec!["https://staging.formation.example.com".to_string()];
        config
    }

    pub fn production() -> Self {
        let mut config = Self::base(Environment::Production);
        config.session.secure = true;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 2 * 1024 * 1024; // 2MB
        config.security.cors_permissive = false;
        config.security.cors_origins = vec!["https://formation.example.com".to_string()];
        config
    }

    /// Development config pointed at a specific upstream, for tests and local tooling
    pub fn for_upstream(base_url: &str) -> Self {
        let mut config = Self::development();
        config.upstream.base_url = normalize_base_url(base_url).unwrap_or_else(|| base_url.to_string());
        config
    }
}

/// Validate an upstream base URL and strip its trailing slash
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    Some(trimmed.trim_end_matches('/').to_string())
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - loaded once at startup, after logging is up
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Load the process config from the environment on first call
pub fn init() -> Result<&'static AppConfig, ConfigError> {
    CONFIG.get_or_try_init(AppConfig::from_env)
}
