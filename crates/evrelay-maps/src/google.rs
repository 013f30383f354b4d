//! Google Maps web-service client (Places Nearby Search, Distance Matrix, Directions).

use anyhow::{Context, Result};
use async_trait::async_trait;
use evrelay_proto::LatLng;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

use crate::{Directions, ExternalLookup, LookupError, MapsConfig, Poi, TravelEstimate, DEFAULT_BASE_URL, DEFAULT_MODE};

// Step text is joined onto one line, so wrapping width only needs to be large.
const STEP_TEXT_WIDTH: usize = 10_000;

pub struct GoogleMaps {
    http: reqwest::Client,
    base_url: String,
    api_key: Zeroizing<String>,
    mode: String,
}

impl GoogleMaps {
    pub fn new(cfg: &MapsConfig, api_key: String) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = cfg.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder.build().context("build maps http client")?;
        Ok(Self {
            http,
            base_url: cfg
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: Zeroizing::new(api_key),
            mode: cfg.mode.clone().unwrap_or_else(|| DEFAULT_MODE.to_string()),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, LookupError> {
        let url = format!("{}/{}/json", self.base_url, endpoint);
        debug!("maps: GET {} {:?}", url, query);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl ExternalLookup for GoogleMaps {
    async fn find_nearby_poi(&self, at: LatLng, radius_m: u32, keyword: &str) -> Result<Option<Poi>, LookupError> {
        let body: NearbyResponse = self
            .get("place/nearbysearch", &[
                ("location", at.to_query()),
                ("radius", radius_m.to_string()),
                ("keyword", keyword.to_string()),
            ])
            .await?;
        parse_nearby(body)
    }

    async fn distance_between(&self, from: LatLng, to: LatLng) -> Result<Option<TravelEstimate>, LookupError> {
        let body: MatrixResponse = self
            .get("distancematrix", &[
                ("origins", from.to_query()),
                ("destinations", to.to_query()),
                ("mode", self.mode.clone()),
            ])
            .await?;
        parse_matrix(body)
    }

    async fn compute_route(&self, from: LatLng, to: LatLng) -> Result<Option<Directions>, LookupError> {
        let body: DirectionsResponse = self
            .get("directions", &[
                ("origin", from.to_query()),
                ("destination", to.to_query()),
                ("mode", self.mode.clone()),
            ])
            .await?;
        parse_directions(body)
    }
}

// ----- Wire -----

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    name: Option<String>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: WireLatLng,
}

#[derive(Debug, Deserialize)]
struct WireLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    legs: Vec<WireLeg>,
}

#[derive(Debug, Deserialize)]
struct WireLeg {
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
struct WireStep {
    #[serde(default)]
    html_instructions: String,
}

// "OK" carries data, "ZERO_RESULTS" is an empty answer, anything else is a failure.
fn check_status(endpoint: &'static str, status: &str, message: Option<String>) -> Result<bool, LookupError> {
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" => Ok(false),
        other => Err(LookupError::Provider {
            endpoint,
            status: other.to_string(),
            message: message.unwrap_or_default(),
        }),
    }
}

fn parse_nearby(body: NearbyResponse) -> Result<Option<Poi>, LookupError> {
    if !check_status("place/nearbysearch", &body.status, body.error_message)? {
        return Ok(None);
    }
    Ok(body.results.into_iter().next().map(|p| Poi {
        name: p.name.unwrap_or_else(|| "EV Charger".to_string()),
        location: LatLng::new(p.geometry.location.lat, p.geometry.location.lng),
    }))
}

fn parse_matrix(body: MatrixResponse) -> Result<Option<TravelEstimate>, LookupError> {
    if !check_status("distancematrix", &body.status, body.error_message)? {
        return Ok(None);
    }
    let el = body
        .rows
        .into_iter()
        .next()
        .and_then(|r| r.elements.into_iter().next())
        .ok_or_else(|| LookupError::Malformed { endpoint: "distancematrix", reason: "no rows/elements".into() })?;
    if el.status != "OK" {
        return Ok(None);
    }
    match (el.distance, el.duration) {
        (Some(d), Some(t)) => Ok(Some(TravelEstimate { distance_m: d.value, eta_text: t.text })),
        _ => Err(LookupError::Malformed { endpoint: "distancematrix", reason: "element without distance/duration".into() }),
    }
}

fn parse_directions(body: DirectionsResponse) -> Result<Option<Directions>, LookupError> {
    if !check_status("directions", &body.status, body.error_message)? {
        return Ok(None);
    }
    let Some(route) = body.routes.into_iter().next() else {
        return Ok(None);
    };
    let steps = route
        .legs
        .into_iter()
        .next()
        .map(|leg| leg.steps.into_iter().map(|s| step_text(&s.html_instructions)).collect())
        .unwrap_or_default();
    Ok(Some(Directions { summary: route.summary, steps }))
}

// Step instructions come as HTML fragments ("Turn <b>right</b>", "&amp;", block <div>s).
fn step_text(html: &str) -> String {
    use html2text::render::text_renderer::TrivialDecorator;

    let text = html2text::from_read_with_decorator(html.as_bytes(), STEP_TEXT_WIDTH, TrivialDecorator::new());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
