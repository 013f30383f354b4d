use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalfunctionStatus {
    MalfunctionOn,
    MalfunctionOff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalfunctionResponse {
    pub status: MalfunctionStatus,
}

/// Delivery counters of the alert webhook link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkReport {
    pub last_rtt_ms: Option<u32>,
    pub consecutive_failures: u32,
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub needs_charge: bool,
    pub malfunction_active: bool,
    pub alert_link: LinkReport,
}
