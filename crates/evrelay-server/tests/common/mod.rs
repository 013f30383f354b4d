#![allow(dead_code)]

use async_trait::async_trait;
use evrelay_alert::{AlertGateway, DeliveryError};
use evrelay_maps::{ChargerLocator, Directions, ExternalLookup, LookupError, Poi, SearchSettings, TravelEstimate};
use evrelay_proto::{alert::AlertPayload, LatLng};
use evrelay_server::{auth::ApiKeyVerifier, AppState};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zeroize::Zeroizing;

pub const API_KEY: &str = "test-key";
pub const STATION: &str = "ChargePoint Charging Station";

/// Maps provider with one station 1218m / "5 mins" away.
#[derive(Default)]
pub struct FakeLookup {
    pub no_results: AtomicBool,
    pub failing: AtomicBool,
    pub searches: AtomicUsize,
    pub searched_at: Mutex<Vec<LatLng>>,
}

impl FakeLookup {
    fn check(&self) -> Result<(), LookupError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LookupError::Provider {
                endpoint: "place/nearbysearch",
                status: "UNKNOWN_ERROR".into(),
                message: "backend unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ExternalLookup for FakeLookup {
    async fn find_nearby_poi(&self, at: LatLng, _radius_m: u32, keyword: &str) -> Result<Option<Poi>, LookupError> {
        assert_eq!(keyword, "EV charger");
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.searched_at.lock().unwrap().push(at);
        self.check()?;
        if self.no_results.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(Poi { name: STATION.into(), location: LatLng::new(37.7650, -122.4200) }))
    }

    async fn distance_between(&self, _from: LatLng, _to: LatLng) -> Result<Option<TravelEstimate>, LookupError> {
        self.check()?;
        Ok(Some(TravelEstimate { distance_m: 1218, eta_text: "5 mins".into() }))
    }

    async fn compute_route(&self, _from: LatLng, _to: LatLng) -> Result<Option<Directions>, LookupError> {
        self.check()?;
        Ok(Some(Directions {
            summary: "I-280 N".into(),
            steps: vec![
                "Head north on Main St".into(),
                "Turn right onto I-280 N ramp".into(),
                "Take exit 23 for El Camino Real".into(),
            ],
        }))
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub failing: AtomicBool,
    pub posted: Mutex<Vec<AlertPayload>>,
}

#[async_trait]
impl AlertGateway for FakeGateway {
    async fn post(&self, payload: &AlertPayload) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected { status: 503 });
        }
        self.posted.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

pub struct Harness {
    pub lookup: Arc<FakeLookup>,
    pub gateway: Arc<FakeGateway>,
    pub state: Arc<AppState>,
}

pub fn harness() -> Harness {
    let lookup = Arc::new(FakeLookup::default());
    let gateway = Arc::new(FakeGateway::default());
    let locator = ChargerLocator::new(lookup.clone(), SearchSettings::default());
    let state = AppState::new(
        ApiKeyVerifier::new(Zeroizing::new(API_KEY.to_string())),
        gateway.clone(),
        locator,
        evrelay_state::DEFAULT_CLEAR_AFTER,
    );
    Harness { lookup, gateway, state: Arc::new(state) }
}
