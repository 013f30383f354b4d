use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use evrelay_proto::{
    alert::{AlertEvent, AlertResponse},
    status::{HealthResponse, MalfunctionResponse, MalfunctionStatus, StatusResponse},
};
use std::sync::Arc;
use tracing::debug;

use crate::{auth::Authorized, error::ApiError, AppState};

type AppStateArc = Arc<AppState>;

// ----- Alerts -----

pub fn alert_routes() -> Router<AppStateArc> {
    Router::new().route("/low-battery-alert", post(low_battery_alert))
}

async fn low_battery_alert(
    State(state): State<AppStateArc>,
    _auth: Authorized,
    body: Result<Json<AlertEvent>, JsonRejection>,
) -> Result<Json<AlertResponse>, ApiError> {
    let Json(ev) = body.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    ev.validate().map_err(|e| {
        debug!("alert rejected: {}", e);
        ApiError::Unprocessable(e.to_string())
    })?;
    Ok(Json(state.alerts.handle(&ev).await?))
}

// ----- Status -----

pub fn status_routes() -> Router<AppStateArc> {
    Router::new().route("/charge-status", get(charge_status))
}

async fn charge_status(State(state): State<AppStateArc>) -> Json<StatusResponse> {
    Json(state.status.query().await)
}

// ----- Malfunction -----

pub fn malfunction_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/battery-malfunction/on", post(malfunction_on))
        .route("/battery-malfunction/off", post(malfunction_off))
}

async fn malfunction_on(State(state): State<AppStateArc>) -> Json<MalfunctionResponse> {
    state.malfunction.set_active(true);
    Json(MalfunctionResponse { status: MalfunctionStatus::MalfunctionOn })
}

async fn malfunction_off(State(state): State<AppStateArc>) -> Json<MalfunctionResponse> {
    state.malfunction.set_active(false);
    Json(MalfunctionResponse { status: MalfunctionStatus::MalfunctionOff })
}

// ----- Health -----

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/healthz", get(health))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let snap = state.charge.peek();
    Json(HealthResponse {
        status: "ok".to_string(),
        needs_charge: snap.needs_charge(),
        malfunction_active: state.malfunction.is_active(),
        alert_link: state.gateway.link_report(),
    })
}
