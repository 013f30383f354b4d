use evrelay_proto::{alert::RouteResult, LatLng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{ExternalLookup, MapsConfig, DEFAULT_KEYWORD, DEFAULT_ROUTE_RADIUS_M, DEFAULT_STATUS_RADIUS_M};

const METERS_TO_MILES: f64 = 0.00062137;

/// Miles truncated (not rounded) to one decimal.
pub fn meters_to_miles(meters: u64) -> f64 {
    (meters as f64 * METERS_TO_MILES * 10.0).floor() / 10.0
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub status_radius_m: u32,
    pub route_radius_m: u32,
    pub keyword: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            status_radius_m: DEFAULT_STATUS_RADIUS_M,
            route_radius_m: DEFAULT_ROUTE_RADIUS_M,
            keyword: DEFAULT_KEYWORD.to_string(),
        }
    }
}

impl SearchSettings {
    pub fn from_config(cfg: &MapsConfig) -> Self {
        Self {
            status_radius_m: cfg.status_radius_m.unwrap_or(DEFAULT_STATUS_RADIUS_M),
            route_radius_m: cfg.route_radius_m.unwrap_or(DEFAULT_ROUTE_RADIUS_M),
            keyword: cfg.keyword.clone().unwrap_or_else(|| DEFAULT_KEYWORD.to_string()),
        }
    }
}

/// Nearest charger as shown to the driver. `None` fields render as unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargerInfo {
    pub name: Option<String>,
    pub distance_m: Option<u64>,
    pub eta: Option<String>,
}

impl ChargerInfo {
    pub fn unknown() -> Self {
        Self { name: None, distance_m: None, eta: None }
    }

    pub fn name_text(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    pub fn eta_text(&self) -> &str {
        self.eta.as_deref().unwrap_or("unknown")
    }

    pub fn miles_text(&self) -> String {
        match self.distance_m {
            Some(m) => format!("{:.1}", meters_to_miles(m)),
            None => "Unknown".to_string(),
        }
    }
}

/// Lookups that came back empty vs lookups that failed. Both look the same
/// to the driver, so they are only told apart here and in the logs.
#[derive(Debug, Default)]
pub struct LookupStats {
    empty: AtomicU64,
    failed: AtomicU64,
}

impl LookupStats {
    pub fn empty(&self) -> u64 {
        self.empty.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn on_empty(&self) {
        self.empty.fetch_add(1, Ordering::Relaxed);
    }

    fn on_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Charger search and routing on top of an [`ExternalLookup`]. Neither
/// operation fails: provider errors are logged and turned into placeholders.
/// Clones share one [`LookupStats`].
#[derive(Clone)]
pub struct ChargerLocator {
    lookup: Arc<dyn ExternalLookup>,
    settings: SearchSettings,
    stats: Arc<LookupStats>,
}

impl ChargerLocator {
    pub fn new(lookup: Arc<dyn ExternalLookup>, settings: SearchSettings) -> Self {
        Self { lookup, settings, stats: Arc::default() }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }

    pub async fn nearest_charger(&self, at: LatLng) -> ChargerInfo {
        let poi = match self.lookup.find_nearby_poi(at, self.settings.status_radius_m, &self.settings.keyword).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                self.stats.on_empty();
                info!("maps: no charger within {}m of {},{}", self.settings.status_radius_m, at.lat, at.lon);
                return ChargerInfo::unknown();
            }
            Err(e) => {
                self.stats.on_failure();
                warn!("maps: charger search failed: {}", e);
                return ChargerInfo::unknown();
            }
        };

        let mut info = ChargerInfo { name: Some(poi.name), distance_m: None, eta: None };
        match self.lookup.distance_between(at, poi.location).await {
            Ok(Some(est)) => {
                info.distance_m = Some(est.distance_m);
                info.eta = Some(est.eta_text);
            }
            Ok(None) => {
                self.stats.on_empty();
                info!("maps: no travel estimate to {}", info.name_text());
            }
            Err(e) => {
                self.stats.on_failure();
                warn!("maps: distance lookup failed: {}", e);
            }
        }
        info
    }

    pub async fn compute_route(&self, at: LatLng) -> RouteResult {
        let poi = match self.lookup.find_nearby_poi(at, self.settings.route_radius_m, &self.settings.keyword).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                self.stats.on_empty();
                info!("maps: no charger within {}m for routing", self.settings.route_radius_m);
                return RouteResult {
                    destination: "Unknown".into(),
                    route_summary: "No chargers found nearby".into(),
                    steps: Vec::new(),
                };
            }
            Err(e) => {
                self.stats.on_failure();
                warn!("maps: charger search for route failed: {}", e);
                return RouteResult::degraded(format!("Error finding route: {}", e));
            }
        };

        match self.lookup.compute_route(at, poi.location).await {
            Ok(Some(d)) => RouteResult { destination: poi.name, route_summary: d.summary, steps: d.steps },
            Ok(None) => {
                self.stats.on_empty();
                RouteResult { destination: poi.name, route_summary: "Route unavailable".into(), steps: Vec::new() }
            }
            Err(e) => {
                self.stats.on_failure();
                warn!("maps: directions failed: {}", e);
                RouteResult::degraded(format!("Error finding route: {}", e))
            }
        }
    }
}
