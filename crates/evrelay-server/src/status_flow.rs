use evrelay_maps::{ChargerInfo, ChargerLocator};
use evrelay_proto::status::StatusResponse;
use evrelay_state::{ChargeState, MalfunctionFlag, StatusOutcome};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tracing::info;

pub const CHARGE_OK: &str = "Your vehicle charge is okay. ";

pub const MALFUNCTION_ADVISORY: &str = "There is a DTC malfunction code P0AFA active - it is for High-voltage battery \
system voltage imbalance. To remedy it please go to a nearest service shop to undertake the software update for \
improved cell-balancing logic.";

pub fn needs_charge_message(charger: &ChargerInfo) -> String {
    format!(
        "Your battery charge is below 20%, recharge shortly -- I've looked nearby stations and the closest is {}, {} and {} miles away. ",
        charger.name_text(),
        charger.eta_text(),
        charger.miles_text(),
    )
}

/// Answers a charge-status poll.
pub struct StatusWorkflow {
    charge: Arc<ChargeState>,
    malfunction: Arc<MalfunctionFlag>,
    locator: ChargerLocator,
    clear_after: Duration,
}

impl StatusWorkflow {
    pub fn new(charge: Arc<ChargeState>, malfunction: Arc<MalfunctionFlag>, locator: ChargerLocator, clear_after: Duration) -> Self {
        Self { charge, malfunction, locator, clear_after }
    }

    pub async fn query(&self) -> StatusResponse {
        self.query_at(OffsetDateTime::now_utc()).await
    }

    /// A stale condition (older than `clear_after`) reports OK. A fresh one is
    /// reported once, with the nearest charger, and cleared by this poll.
    pub async fn query_at(&self, now: OffsetDateTime) -> StatusResponse {
        let mut message = match self.charge.take_for_status(self.clear_after, now) {
            StatusOutcome::ChargeOk { auto_cleared } => {
                if auto_cleared {
                    info!("status: low-battery condition older than {}s expired unreported", self.clear_after.whole_seconds());
                }
                CHARGE_OK.to_string()
            }
            StatusOutcome::NeedsCharge(low) => {
                // lock already released; lookup runs on the captured location
                let charger = self.locator.nearest_charger(low.location).await;
                needs_charge_message(&charger)
            }
        };
        if self.malfunction.is_active() {
            message.push_str(MALFUNCTION_ADVISORY);
        }
        StatusResponse { message }
    }
}
