//! HTTP relay for vehicle low-battery alerts.

pub mod alert_flow;
pub mod auth;
pub mod error;
pub mod routes;
pub mod status_flow;

use anyhow::Result;
use axum::Router;
use evrelay_alert::AlertGateway;
use evrelay_maps::ChargerLocator;
use evrelay_state::{ChargeState, MalfunctionFlag};
use std::net::SocketAddr;
use std::sync::Arc;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::alert_flow::AlertWorkflow;
use crate::auth::ApiKeyVerifier;
use crate::status_flow::StatusWorkflow;

/// Everything the handlers share. State objects are owned here and handed
/// to the workflows, never reached through globals.
pub struct AppState {
    pub auth: ApiKeyVerifier,
    pub charge: Arc<ChargeState>,
    pub malfunction: Arc<MalfunctionFlag>,
    pub gateway: Arc<dyn AlertGateway>,
    pub alerts: AlertWorkflow,
    pub status: StatusWorkflow,
}

impl AppState {
    pub fn new(auth: ApiKeyVerifier, gateway: Arc<dyn AlertGateway>, locator: ChargerLocator, clear_after: Duration) -> Self {
        let charge = Arc::new(ChargeState::new());
        let malfunction = Arc::new(MalfunctionFlag::new());
        Self {
            auth,
            alerts: AlertWorkflow::new(charge.clone(), gateway.clone(), locator.clone()),
            status: StatusWorkflow::new(charge.clone(), malfunction.clone(), locator, clear_after),
            charge,
            malfunction,
            gateway,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::alert_routes())
        .merge(routes::status_routes())
        .merge(routes::malfunction_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve until ctrl-c.
pub async fn serve(bind: SocketAddr, state: AppState) -> Result<()> {
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("server: listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("server: shutting down");
        })
        .await?;
    Ok(())
}
