use anyhow::{Context, Result};
use url::Url;

use crate::MapsConfig;

pub fn check_maps(cfg: &MapsConfig, api_key: Option<&str>) -> Result<()> {
    anyhow::ensure!(api_key.map(|k| !k.trim().is_empty()).unwrap_or(false),
        "maps.api_key missing (set it or export GOOGLEMAPS_API_KEY)");
    if let Some(raw) = &cfg.base_url {
        let url = Url::parse(raw).with_context(|| format!("maps.base_url invalid: {}", raw))?;
        anyhow::ensure!(matches!(url.scheme(), "http" | "https"), "maps.base_url must be http(s): {}", raw);
        anyhow::ensure!(url.host_str().map(|h| !h.is_empty()).unwrap_or(false), "maps.base_url has no host: {}", raw);
    }
    for (name, r) in [("maps.status_radius_m", cfg.status_radius_m), ("maps.route_radius_m", cfg.route_radius_m)] {
        if let Some(r) = r {
            // Places Nearby Search caps the radius at 50km
            anyhow::ensure!((100..=50_000).contains(&r), "{} should be 100..50000, got {}", name, r);
        }
    }
    if let Some(k) = &cfg.keyword {
        anyhow::ensure!(!k.trim().is_empty(), "maps.keyword is empty");
    }
    if let Some(m) = &cfg.mode {
        anyhow::ensure!(matches!(m.as_str(), "driving" | "walking" | "bicycling" | "transit"), "maps.mode unknown: {}", m);
    }
    if let Some(t) = cfg.timeout_ms {
        anyhow::ensure!(t >= 500, "maps.timeout_ms too small; set >= 500");
    }
    Ok(())
}
