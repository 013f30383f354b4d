use evrelay_proto::LatLng;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};
use tracing::info;

/// An unresolved low-battery condition is dropped after this long.
pub const DEFAULT_CLEAR_AFTER: Duration = Duration::minutes(5);

/// An outstanding low-battery condition: when it was recorded and where the vehicle was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowBattery {
    pub recorded_at: OffsetDateTime,
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChargeSnapshot {
    pub pending: Option<LowBattery>,
}

impl ChargeSnapshot {
    pub fn needs_charge(&self) -> bool {
        self.pending.is_some()
    }

    pub fn recorded_at(&self) -> Option<OffsetDateTime> {
        self.pending.map(|p| p.recorded_at)
    }

    pub fn location(&self) -> Option<LatLng> {
        self.pending.map(|p| p.location)
    }
}

/// What a status poll should report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusOutcome {
    /// Nothing outstanding. `auto_cleared` is set when this poll expired a stale condition.
    ChargeOk { auto_cleared: bool },
    /// The condition this poll consumed.
    NeedsCharge(LowBattery),
}

/// Process-wide charge state. "needs charge", timestamp and location live in
/// one `Option` behind one lock, so they are always set and cleared together.
#[derive(Debug, Default)]
pub struct ChargeState {
    pending: Mutex<Option<LowBattery>>,
}

impl ChargeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last writer wins: a second alert replaces the first.
    pub fn record_low_battery(&self, location: LatLng, now: OffsetDateTime) {
        let mut pending = crate::lock(&self.pending);
        if pending.is_some() {
            info!("charge state: low battery re-recorded at {},{}", location.lat, location.lon);
        } else {
            info!("charge state: ok -> needs charge at {},{}", location.lat, location.lon);
        }
        *pending = Some(LowBattery { recorded_at: now, location });
    }

    /// Clears the condition if it is older than `timeout`. Returns true when it did.
    pub fn resolve_if_expired(&self, timeout: Duration, now: OffsetDateTime) -> bool {
        let mut pending = crate::lock(&self.pending);
        expire(&mut pending, timeout, now)
    }

    pub fn peek(&self) -> ChargeSnapshot {
        ChargeSnapshot { pending: *crate::lock(&self.pending) }
    }

    /// Expiry check plus consume, under a single lock. A condition still
    /// inside `timeout` is handed back to the caller and cleared, so only the
    /// first poll after an alert sees it.
    pub fn take_for_status(&self, timeout: Duration, now: OffsetDateTime) -> StatusOutcome {
        let mut pending = crate::lock(&self.pending);
        if expire(&mut pending, timeout, now) {
            return StatusOutcome::ChargeOk { auto_cleared: true };
        }
        match pending.take() {
            Some(low) => {
                info!("charge state: needs charge -> ok (reported)");
                StatusOutcome::NeedsCharge(low)
            }
            None => StatusOutcome::ChargeOk { auto_cleared: false },
        }
    }
}

fn expire(pending: &mut Option<LowBattery>, timeout: Duration, now: OffsetDateTime) -> bool {
    match *pending {
        Some(low) if now - low.recorded_at > timeout => {
            info!("charge state: needs charge -> ok (expired after {})", now - low.recorded_at);
            *pending = None;
            true
        }
        _ => false,
    }
}
