use anyhow::{Context, Result};
use url::Url;

use crate::AlertConfig;

pub fn check_alert(cfg: &AlertConfig) -> Result<()> {
    let url = Url::parse(&cfg.url).with_context(|| format!("alert.url invalid: {}", cfg.url))?;
    anyhow::ensure!(matches!(url.scheme(), "http" | "https"), "alert.url must be http(s): {}", cfg.url);
    anyhow::ensure!(url.host_str().map(|h| !h.is_empty()).unwrap_or(false), "alert.url has no host: {}", cfg.url);
    if url.scheme() == "http" {
        tracing::warn!("alert.url is plain http; alerts carry vehicle position");
    }
    if let Some(t) = cfg.timeout_ms {
        anyhow::ensure!(t >= 500, "alert.timeout_ms too small; set >= 500");
    }
    Ok(())
}
