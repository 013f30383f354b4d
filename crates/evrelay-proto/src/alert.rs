use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::LatLng;

/// Inbound low-battery event as posted by the vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub latitude: f64,
    pub longitude: f64,
    pub direction: f64,
    #[serde(rename = "battery_percentage")]
    pub battery_level: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} out of range: {value} not in [{min}, {max}]")]
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },
}

impl AlertEvent {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("latitude", self.latitude, -90.0, 90.0)?;
        check_range("longitude", self.longitude, -180.0, 180.0)?;
        check_range("battery_percentage", self.battery_level, 0.0, 100.0)?;
        // heading is reported as-is; only reject garbage
        if !self.direction.is_finite() {
            return Err(ValidationError::NotFinite { field: "direction" });
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, value, min, max });
    }
    Ok(())
}

/// Outbound webhook body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub direction: f64,
    pub battery_percentage: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl AlertPayload {
    pub fn from_event(ev: &AlertEvent, timestamp: OffsetDateTime) -> Self {
        Self {
            latitude: ev.latitude,
            longitude: ev.longitude,
            direction: ev.direction,
            battery_percentage: ev.battery_level,
            timestamp,
        }
    }
}

/// Route to the nearest charger. `destination == "error"` marks a degraded result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub destination: String,
    pub route_summary: String,
    pub steps: Vec<String>,
}

impl RouteResult {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self { destination: "error".into(), route_summary: reason.into(), steps: Vec::new() }
    }

    pub fn is_degraded(&self) -> bool {
        self.destination == "error"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub message: String,
    pub route: RouteResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(battery: f64) -> AlertEvent {
        AlertEvent { latitude: 37.7749, longitude: -122.4194, direction: 180.0, battery_level: battery }
    }

    #[test]
    fn battery_level_uses_wire_name() {
        let ev: AlertEvent = serde_json::from_str(
            r#"{"latitude":37.7749,"longitude":-122.4194,"direction":180.0,"battery_percentage":12.5}"#,
        ).unwrap();
        assert_eq!(ev.battery_level, 12.5);
        assert!(ev.validate().is_ok());
    }

    #[test]
    fn missing_field_is_rejected() {
        let res = serde_json::from_str::<AlertEvent>(r#"{"latitude":1.0,"longitude":2.0,"direction":3.0}"#);
        assert!(res.is_err());
    }

    #[test]
    fn battery_bounds_are_inclusive() {
        assert!(event(0.0).validate().is_ok());
        assert!(event(100.0).validate().is_ok());
        assert!(matches!(
            event(120.0).validate(),
            Err(ValidationError::OutOfRange { field: "battery_percentage", .. })
        ));
        assert!(event(-0.5).validate().is_err());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut ev = event(50.0);
        ev.latitude = f64::NAN;
        assert_eq!(ev.validate(), Err(ValidationError::NotFinite { field: "latitude" }));

        let mut ev = event(50.0);
        ev.direction = f64::INFINITY;
        assert_eq!(ev.validate(), Err(ValidationError::NotFinite { field: "direction" }));
    }

    #[test]
    fn payload_timestamp_is_rfc3339() {
        let ts = time::macros::datetime!(2024-05-01 12:30:00 UTC);
        let p = AlertPayload::from_event(&event(12.5), ts);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["timestamp"], "2024-05-01T12:30:00Z");
        assert_eq!(v["battery_percentage"], 12.5);
    }
}
