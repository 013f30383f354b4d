use evrelay_alert::{AlertGateway, DeliveryError};
use evrelay_maps::ChargerLocator;
use evrelay_proto::alert::{AlertEvent, AlertPayload, AlertResponse};
use evrelay_state::ChargeState;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

pub const ALERT_SENT: &str = "Alert sent and route computed";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Inbound low-battery event: record it, forward it, plan a route.
pub struct AlertWorkflow {
    charge: Arc<ChargeState>,
    gateway: Arc<dyn AlertGateway>,
    locator: ChargerLocator,
}

impl AlertWorkflow {
    pub fn new(charge: Arc<ChargeState>, gateway: Arc<dyn AlertGateway>, locator: ChargerLocator) -> Self {
        Self { charge, gateway, locator }
    }

    pub async fn handle(&self, ev: &AlertEvent) -> Result<AlertResponse, AlertError> {
        self.handle_at(ev, OffsetDateTime::now_utc()).await
    }

    /// The charge state is written before delivery and stays written if
    /// delivery fails.
    pub async fn handle_at(&self, ev: &AlertEvent, now: OffsetDateTime) -> Result<AlertResponse, AlertError> {
        self.charge.record_low_battery(ev.location(), now);

        self.gateway.post(&AlertPayload::from_event(ev, now)).await?;

        let route = self.locator.compute_route(ev.location()).await;
        info!("alert: battery {}% at {},{} -> route to {:?}", ev.battery_level, ev.latitude, ev.longitude, route.destination);
        Ok(AlertResponse { message: ALERT_SENT.to_string(), route })
    }
}
