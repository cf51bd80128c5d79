use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::middleware::{GuardDecision, RouteGuard};

pub fn handle(
    config: &AppConfig,
    path: &str,
    session: Option<&str>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let guard = RouteGuard::new(&config.routes);

    if !guard.is_guarded(path) {
        return output_success(
            &output_format,
            &format!("{} bypasses the route guard", path),
            Some(json!({ "path": path, "guarded": false, "decision": "allow" })),
        );
    }

    match guard.decide(path, session) {
        GuardDecision::Allow => output_success(
            &output_format,
            &format!("{} is allowed", path),
            Some(json!({ "path": path, "guarded": true, "decision": "allow" })),
        ),
        GuardDecision::Redirect(location) => output_success(
            &output_format,
            &format!("{} redirects to {}", path, location),
            Some(json!({
                "path": path,
                "guarded": true,
                "decision": "redirect",
                "location": location
            })),
        ),
    }
}
