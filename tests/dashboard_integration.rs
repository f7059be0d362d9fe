#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Dashboard integration tests
//!
//! Serves the full router in front of the mock device backend and drives
//! it the way the page does: form posts followed by redirects, with bus
//! events telling open pages to reload.

mod mock_servers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tower::ServiceExt;

use home_device_dashboard::api::AppState;
use home_device_dashboard::bus::{create_bus, BusEvent};
use home_device_dashboard::client::HttpDeviceClient;
use home_device_dashboard::refresh::AutoRefresh;
use home_device_dashboard::router::router;
use home_device_dashboard::services::DeviceService;
use mock_servers::MockDeviceBackend;

struct Harness {
    server: MockDeviceBackend,
    service: DeviceService,
    app: axum::Router,
    events: broadcast::Receiver<BusEvent>,
}

async fn harness() -> Harness {
    let server = MockDeviceBackend::start().await;
    let backend = HttpDeviceClient::new(&server.url(), Duration::from_secs(2)).unwrap();
    let bus = create_bus();
    let events = bus.subscribe();
    let service = DeviceService::new(Arc::new(backend), bus);
    let refresh = Arc::new(AutoRefresh::new(service.clone(), Duration::from_secs(60)));
    let app = router(AppState::new(service.clone(), refresh, &server.url()));
    Harness {
        server,
        service,
        app,
        events,
    }
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Wait for a specific event type with timeout
async fn expect_event<F>(rx: &mut broadcast::Receiver<BusEvent>, predicate: F) -> Option<BusEvent>
where
    F: Fn(&BusEvent) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    })
    .await
    .unwrap_or(None)
}

#[tokio::test]
async fn grouped_devices_are_served_as_json() {
    let h = harness().await;
    h.server
        .add_device(json!({"id": "l1", "type": "light", "room": "kitchen"}))
        .await;
    h.server
        .add_device(json!({"id": "l2", "type": "light", "room": "living_room"}))
        .await;
    h.server
        .add_device(json!({"id": "c1", "type": "curtain", "room": "kitchen"}))
        .await;

    let (status, body) = get_json(&h.app, "/dashboard?group_by=room").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_by"], "room");
    let labels: Vec<&str> = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Kitchen", "Living Room"]);
    assert!(body["status"]
        .as_str()
        .unwrap()
        .starts_with("Data retrieved at "));

    h.server.stop().await;
}

#[tokio::test]
async fn cached_data_is_reused_until_a_write() {
    let mut h = harness().await;
    h.server
        .add_device(json!({"id": "l1", "type": "light", "name": "Lamp", "status": "off"}))
        .await;

    get_json(&h.app, "/dashboard").await;
    get_json(&h.app, "/dashboard").await;
    assert_eq!(h.server.requests().await, vec!["GET ids", "GET l1"]);

    let response = h
        .app
        .clone()
        .oneshot(form("/ui/devices/l1/status", "field=status&value=on"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(expect_event(&mut h.events, |e| matches!(e, BusEvent::DeviceUpdated { id } if id == "l1"))
        .await
        .is_some());

    let (_, body) = get_json(&h.app, "/dashboard").await;
    assert_eq!(body["groups"][0]["devices"][0]["status"], "on");

    h.server.stop().await;
}

#[tokio::test]
async fn backend_failure_shows_error_message() {
    let h = harness().await;
    h.server
        .fail_next(StatusCode::SERVICE_UNAVAILABLE, Some("Backend is restarting"))
        .await;

    let (status, body) = get_json(&h.app, "/dashboard").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Backend is restarting");

    // Errors are not cached; the next load goes back to the backend.
    let (status, _) = get_json(&h.app, "/dashboard").await;
    assert_eq!(status, StatusCode::OK);

    h.server.stop().await;
}

#[tokio::test]
async fn added_device_is_stored_with_defaults() {
    let mut h = harness().await;

    let response = h
        .app
        .clone()
        .oneshot(form(
            "/ui/devices",
            "form=1&id=dl1&name=Front+door&room=hall&type=door_lock&param_auto_lock_enabled=on",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(expect_event(&mut h.events, |e| matches!(e, BusEvent::DeviceCreated { .. }))
        .await
        .is_some());

    let stored = h.server.device("dl1").await.unwrap();
    assert_eq!(stored["status"], "unlocked");
    assert_eq!(stored["parameters"]["auto_lock_enabled"], true);
    assert_eq!(stored["parameters"]["battery_level"], 100);

    h.server.stop().await;
}

#[tokio::test]
async fn reload_fetches_everything_again() {
    let mut h = harness().await;
    h.server
        .add_device(json!({"id": "l1", "type": "light"}))
        .await;
    get_json(&h.app, "/dashboard").await;

    let response = h
        .app
        .clone()
        .oneshot(form("/ui/reload", "group_by=room"))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/?group_by=room"
    );
    assert!(expect_event(&mut h.events, |e| matches!(
        e,
        BusEvent::DevicesRefreshed { device_count: 1 }
    ))
    .await
    .is_some());
    assert_eq!(
        h.server.requests().await,
        vec!["GET ids", "GET l1", "GET ids", "GET l1"]
    );
    assert!(!h.service.is_busy());

    h.server.stop().await;
}
