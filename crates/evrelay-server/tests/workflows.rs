//! Alert and status workflows driven directly, with a controlled clock.

mod common;

use common::{harness, STATION};
use evrelay_proto::{alert::AlertEvent, LatLng};
use evrelay_server::alert_flow::{AlertError, ALERT_SENT};
use evrelay_server::status_flow::{CHARGE_OK, MALFUNCTION_ADVISORY};
use std::sync::atomic::Ordering;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const T0: OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

fn sf_event() -> AlertEvent {
    AlertEvent { latitude: 37.7749, longitude: -122.4194, direction: 180.0, battery_level: 12.5 }
}

#[tokio::test]
async fn test_alert_records_state_at_exact_location() {
    let h = harness();
    h.state.alerts.handle_at(&sf_event(), T0).await.unwrap();

    let snap = h.state.charge.peek();
    assert!(snap.needs_charge());
    assert_eq!(snap.location(), Some(LatLng::new(37.7749, -122.4194)));
    assert_eq!(snap.recorded_at(), Some(T0));
}

#[tokio::test]
async fn test_alert_forwards_payload_and_route() {
    let h = harness();
    let resp = h.state.alerts.handle_at(&sf_event(), T0).await.unwrap();

    assert_eq!(resp.message, ALERT_SENT);
    assert_eq!(resp.route.destination, STATION);
    assert_eq!(resp.route.route_summary, "I-280 N");
    assert_eq!(resp.route.steps.len(), 3);

    let posted = h.gateway.posted.lock().unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].battery_percentage, 12.5);
    assert_eq!(posted[0].direction, 180.0);
    assert_eq!(posted[0].timestamp, T0);
}

#[tokio::test]
async fn test_delivery_failure_keeps_state_and_skips_route() {
    let h = harness();
    h.gateway.failing.store(true, Ordering::SeqCst);

    let err = h.state.alerts.handle_at(&sf_event(), T0).await.unwrap_err();
    assert!(matches!(err, AlertError::Delivery(_)));

    // not rolled back
    assert!(h.state.charge.peek().needs_charge());
    assert_eq!(h.lookup.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_route_lookup_failure_is_degraded_not_fatal() {
    let h = harness();
    h.lookup.failing.store(true, Ordering::SeqCst);

    let resp = h.state.alerts.handle_at(&sf_event(), T0).await.unwrap();
    assert_eq!(resp.message, ALERT_SENT);
    assert_eq!(resp.route.destination, "error");
    assert!(resp.route.route_summary.contains("backend unavailable"));
    assert!(resp.route.steps.is_empty());
}

#[tokio::test]
async fn test_first_poll_reports_charger_then_clears() {
    let h = harness();
    h.state.alerts.handle_at(&sf_event(), T0).await.unwrap();
    let searches_after_alert = h.lookup.searches.load(Ordering::SeqCst);

    let first = h.state.status.query_at(T0 + Duration::seconds(30)).await;
    assert!(first.message.starts_with("Your battery charge is below 20%"), "{}", first.message);
    assert!(first.message.contains(STATION));
    assert!(first.message.contains("5 mins"));
    assert!(first.message.contains("0.7 miles away"));
    assert!(!h.state.charge.peek().needs_charge());

    // lookup ran at the recorded location
    assert_eq!(h.lookup.searches.load(Ordering::SeqCst), searches_after_alert + 1);
    assert_eq!(h.lookup.searched_at.lock().unwrap().last(), Some(&LatLng::new(37.7749, -122.4194)));

    let second = h.state.status.query_at(T0 + Duration::seconds(40)).await;
    assert_eq!(second.message, CHARGE_OK);
}

#[tokio::test]
async fn test_stale_condition_expires_without_lookup() {
    let h = harness();
    h.state.alerts.handle_at(&sf_event(), T0).await.unwrap();
    let searches = h.lookup.searches.load(Ordering::SeqCst);

    let resp = h.state.status.query_at(T0 + Duration::minutes(5) + Duration::seconds(1)).await;
    assert_eq!(resp.message, CHARGE_OK);
    assert_eq!(h.lookup.searches.load(Ordering::SeqCst), searches);
    assert!(!h.state.charge.peek().needs_charge());
}

#[tokio::test]
async fn test_no_charger_found_reports_unknown() {
    let h = harness();
    h.lookup.no_results.store(true, Ordering::SeqCst);
    h.state.charge.record_low_battery(LatLng::new(0.0, 0.0), T0);

    let resp = h.state.status.query_at(T0).await;
    assert!(
        resp.message.contains("the closest is Unknown, unknown and Unknown miles away"),
        "{}",
        resp.message
    );
}

#[tokio::test]
async fn test_lookup_failure_on_status_reports_unknown() {
    let h = harness();
    h.lookup.failing.store(true, Ordering::SeqCst);
    h.state.charge.record_low_battery(LatLng::new(0.0, 0.0), T0);

    let resp = h.state.status.query_at(T0).await;
    assert!(resp.message.contains("the closest is Unknown"), "{}", resp.message);
    assert!(!h.state.charge.peek().needs_charge());
}

#[tokio::test]
async fn test_malfunction_advisory_overlays_both_messages() {
    let h = harness();
    h.state.malfunction.set_active(true);

    let ok = h.state.status.query_at(T0).await;
    assert_eq!(ok.message, format!("{}{}", CHARGE_OK, MALFUNCTION_ADVISORY));

    h.state.charge.record_low_battery(LatLng::new(37.7749, -122.4194), T0);
    let degraded = h.state.status.query_at(T0).await;
    assert!(degraded.message.contains("0.7 miles away. "));
    assert!(degraded.message.ends_with(MALFUNCTION_ADVISORY));

    h.state.malfunction.set_active(false);
    let ok = h.state.status.query_at(T0).await;
    assert!(!ok.message.contains("P0AFA"));
}

#[tokio::test]
async fn test_new_alert_after_report_is_reported_again() {
    let h = harness();
    h.state.alerts.handle_at(&sf_event(), T0).await.unwrap();
    let _ = h.state.status.query_at(T0).await;

    let later = T0 + Duration::minutes(1);
    h.state.alerts.handle_at(&sf_event(), later).await.unwrap();
    let resp = h.state.status.query_at(later).await;
    assert!(resp.message.contains(STATION));
}
