pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "formation")]
#[command(about = "Operator tooling for the formation gateway")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show how the route guard treats a path")]
    Route {
        #[arg(help = "Request path, e.g. /dashboard/orders")]
        path: String,
        #[arg(long, help = "Pretend the browser sends this session cookie value")]
        session: Option<String>,
    },

    #[command(about = "Check that the upstream API answers")]
    Ping {
        #[arg(long, help = "Upstream base URL (defaults to API_BASE_URL)")]
        url: Option<String>,
    },

    #[command(about = "Print the effective gateway configuration")]
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::init()?;

    match cli.command {
        Commands::Route { path, session } => {
            commands::route::handle(config, &path, session.as_deref(), output_format)
        }
        Commands::Ping { url } => commands::ping::handle(config, url, output_format).await,
        Commands::Config => commands::config::handle(config, output_format),
    }
}
