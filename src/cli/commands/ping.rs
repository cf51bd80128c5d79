use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::{normalize_base_url, AppConfig};
use crate::upstream::{is_json_content_type, UpstreamClient};

pub async fn handle(
    config: &AppConfig,
    url: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let base_url = match url {
        Some(raw) => normalize_base_url(&raw)
            .ok_or_else(|| anyhow::anyhow!("'{}' is not an http(s) URL", raw))?,
        None => config.upstream.base_url.clone(),
    };

    let client = UpstreamClient::new(base_url.clone())?;

    match client.ping().await {
        Ok((status, content_type)) => {
            let json_reply = content_type.as_deref().map(is_json_content_type).unwrap_or(false);
            output_success(
                &output_format,
                &format!(
                    "{} answered {} ({})",
                    base_url,
                    status,
                    content_type.as_deref().unwrap_or("no content type")
                ),
                Some(json!({
                    "url": base_url,
                    "status": status.as_u16(),
                    "content_type": content_type,
                    "json": json_reply
                })),
            )
        }
        Err(e) => {
            output_error(&output_format, &format!("{} is unreachable: {}", base_url, e), Some("UPSTREAM_UNREACHABLE"))?;
            Err(anyhow::anyhow!("upstream ping failed"))
        }
    }
}
