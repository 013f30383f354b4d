use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

use evrelay_alert::{doctor as alert_doctor, AlertConfig, WebhookGateway};
use evrelay_maps::google::GoogleMaps;
use evrelay_maps::{doctor as maps_doctor, ChargerLocator, MapsConfig, SearchSettings};
use evrelay_proto::LatLng;
use evrelay_server::auth::ApiKeyVerifier;
use evrelay_server::AppState;

const API_KEY_ENV: &str = "SECURITY_API_KEY";
const MAPS_KEY_ENV: &str = "GOOGLEMAPS_API_KEY";
const DEFAULT_BIND: &str = "127.0.0.1:8000";

#[derive(Debug, Parser)]
#[command(name = "evrelay", version, about = "evrelay - low-battery alert relay and charger finder")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve,
    /// Validate the configuration file and secrets.
    Doctor,
    /// One-shot nearest-charger lookup.
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    #[serde(default)]
    server: ServerCfg,
    #[serde(default)]
    auth: AuthCfg,
    alert: AlertConfig,
    maps: MapsConfig,
    #[serde(default)]
    status: StatusCfg,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ServerCfg {
    bind: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct AuthCfg {
    /// Falls back to $SECURITY_API_KEY.
    api_key: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct StatusCfg {
    /// Seconds before an unreported low-battery condition is dropped.
    timeout_s: Option<i64>,
}

impl Config {
    fn bind(&self) -> Result<SocketAddr> {
        let s = self.server.bind.as_deref().unwrap_or(DEFAULT_BIND);
        s.parse().with_context(|| format!("server.bind invalid: {}", s))
    }

    fn clear_after(&self) -> Result<time::Duration> {
        match self.status.timeout_s {
            Some(t) => {
                // a zero or negative window expires every alert before it can be reported
                anyhow::ensure!(t >= 1, "status.timeout_s must be >= 1, got {}", t);
                Ok(time::Duration::seconds(t))
            }
            None => Ok(evrelay_state::DEFAULT_CLEAR_AFTER),
        }
    }

    fn api_key(&self) -> Option<Zeroizing<String>> {
        secret(self.auth.api_key.as_ref(), API_KEY_ENV)
    }

    fn maps_key(&self) -> Option<Zeroizing<String>> {
        secret(self.maps.api_key.as_ref(), MAPS_KEY_ENV)
    }
}

// Config value wins over the environment; blank counts as unset.
fn secret(configured: Option<&String>, env: &str) -> Option<Zeroizing<String>> {
    let set = |s: &String| !s.trim().is_empty();
    configured
        .filter(|s| set(*s))
        .cloned()
        .or_else(|| std::env::var(env).ok().filter(set))
        .map(Zeroizing::new)
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    toml::from_str(&s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Serve => serve(&cfg).await?,
        Command::Doctor => doctor(&cfg)?,
        Command::Nearest { lat, lon } => nearest(&cfg, LatLng::new(lat, lon)).await?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    cfg.bind()?;
    anyhow::ensure!(cfg.api_key().is_some(), "auth.api_key missing (set it or export {})", API_KEY_ENV);
    let clear_after = cfg.clear_after()?;
    if clear_after > time::Duration::HOUR {
        warn!("status.timeout_s={} keeps stale alerts for over an hour", clear_after.whole_seconds());
    }
    alert_doctor::check_alert(&cfg.alert)?;
    maps_doctor::check_maps(&cfg.maps, cfg.maps_key().as_deref().map(|s| s.as_str()))?;

    info!("doctor: OK");
    Ok(())
}

fn locator(cfg: &Config) -> Result<ChargerLocator> {
    let key = cfg.maps_key().with_context(|| format!("maps.api_key missing (set it or export {})", MAPS_KEY_ENV))?;
    let maps = GoogleMaps::new(&cfg.maps, key.as_str().to_string())?;
    Ok(ChargerLocator::new(Arc::new(maps), SearchSettings::from_config(&cfg.maps)))
}

async fn serve(cfg: &Config) -> Result<()> {
    let bind = cfg.bind()?;
    let clear_after = cfg.clear_after()?;
    let key = cfg.api_key().with_context(|| format!("auth.api_key missing (set it or export {})", API_KEY_ENV))?;
    let auth = ApiKeyVerifier::new(key);
    info!("serve: api key {}..., alert endpoint {}", auth.fingerprint(), cfg.alert.url);

    let gateway = Arc::new(WebhookGateway::new(&cfg.alert)?);
    let state = AppState::new(auth, gateway, locator(cfg)?, clear_after);
    evrelay_server::serve(bind, state).await
}

async fn nearest(cfg: &Config, at: LatLng) -> Result<()> {
    let loc = locator(cfg)?;
    let charger = loc.nearest_charger(at).await;
    println!("NEAREST: {} eta={} miles={}", charger.name_text(), charger.eta_text(), charger.miles_text());

    let route = loc.compute_route(at).await;
    println!("ROUTE: {} via {}", route.destination, route.route_summary);
    for (i, step) in route.steps.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, step);
    }
    Ok(())
}
