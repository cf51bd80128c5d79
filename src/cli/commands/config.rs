use serde_json::json;

use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "config": config }))?);
        }
        OutputFormat::Text => {
            println!("Environment:     {:?}", config.environment);
            println!("Listen:          {}", config.bind_addr());
            println!("Upstream:        {}", config.upstream.base_url);
            println!("API prefix:      {}", config.routes.api_prefix);
            println!("Admin area:      {} (login {})", config.routes.admin_prefix, config.routes.admin_login_path);
            println!("User area:       {} (login {})", config.routes.user_prefix, config.routes.login_path);
            println!("Logout endpoints: {}", config.routes.logout_endpoints.join(", "));
            println!(
                "Session cookie:  {} (secure: {}, max-age: {}s)",
                config.session.cookie_name, config.session.secure, config.session.max_age_secs
            );
        }
    }
    Ok(())
}
