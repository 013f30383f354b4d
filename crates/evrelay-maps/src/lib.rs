pub mod doctor;
pub mod google;
mod locator;

pub use locator::{meters_to_miles, ChargerInfo, ChargerLocator, LookupStats, SearchSettings};

use async_trait::async_trait;
use evrelay_proto::LatLng;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
pub const DEFAULT_KEYWORD: &str = "EV charger";
pub const DEFAULT_STATUS_RADIUS_M: u32 = 5_000;
pub const DEFAULT_ROUTE_RADIUS_M: u32 = 10_000;
pub const DEFAULT_MODE: &str = "driving";

#[derive(Debug, Clone, Deserialize)]
pub struct MapsConfig {
    /// Falls back to $GOOGLEMAPS_API_KEY when absent.
    pub api_key: Option<String>,
    pub base_url: Option<String>,

    /// Search radius used when answering a status poll.
    pub status_radius_m: Option<u32>,
    /// Search radius used when planning a route after an alert.
    pub route_radius_m: Option<u32>,

    pub keyword: Option<String>,
    /// Travel mode for distance and directions ("driving", "walking", ...).
    pub mode: Option<String>,
    /// Request timeout. Unset means no client-side timeout.
    pub timeout_ms: Option<u64>,
}

/// A point of interest returned by a nearby search.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub name: String,
    pub location: LatLng,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TravelEstimate {
    pub distance_m: u64,
    /// Human readable, e.g. "5 mins".
    pub eta_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directions {
    pub summary: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LookupError {
    /// Carries no URL: the request URL holds the API key.
    #[error("maps request failed: {0}")]
    Transport(reqwest::Error),
    #[error("maps {endpoint} returned {status}: {message}")]
    Provider { endpoint: &'static str, status: String, message: String },
    #[error("maps {endpoint} response malformed: {reason}")]
    Malformed { endpoint: &'static str, reason: String },
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        LookupError::Transport(e.without_url())
    }
}

/// Places/distance/directions provider. `Ok(None)` means the provider
/// answered but had nothing to offer; `Err` means the call itself failed.
#[async_trait]
pub trait ExternalLookup: Send + Sync {
    /// Closest match for `keyword` within `radius_m` of `at`.
    async fn find_nearby_poi(&self, at: LatLng, radius_m: u32, keyword: &str) -> Result<Option<Poi>, LookupError>;

    async fn distance_between(&self, from: LatLng, to: LatLng) -> Result<Option<TravelEstimate>, LookupError>;

    async fn compute_route(&self, from: LatLng, to: LatLng) -> Result<Option<Directions>, LookupError>;
}
