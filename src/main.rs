use formation_gateway::config::{self, Environment};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up API_BASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    let default_filter = match Environment::from_env() {
        Environment::Production => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = config::init().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;
    tracing::info!("Starting formation-gateway in {:?} mode", config.environment);

    formation_gateway::server::serve(config.clone()).await
}
