//! Mock device REST backend
//!
//! Serves `/api/ids` and `/api/devices/...` from an in-memory map.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

#[derive(Default)]
struct MockBackendState {
    devices: BTreeMap<String, Value>,
    /// "METHOD id" for every request, in arrival order
    requests: Vec<String>,
    /// Status and optional error message for the next request
    fail_next: Option<(StatusCode, Option<String>)>,
}

type Shared = Arc<RwLock<MockBackendState>>;

/// Mock device backend
pub struct MockDeviceBackend {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockDeviceBackend {
    /// Start a mock backend on a random port
    pub async fn start() -> Self {
        let state: Shared = Arc::new(RwLock::new(MockBackendState::default()));

        let app = Router::new()
            .route("/api/ids", get(list_ids))
            .route("/api/devices", post(create_device))
            .route(
                "/api/devices/{id}",
                get(get_device).put(update_device).delete(delete_device),
            )
            .route("/api/devices/{id}/action", post(device_action))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn add_device(&self, device: Value) {
        let id = device["id"].as_str().unwrap_or_default().to_string();
        self.state.write().await.devices.insert(id, device);
    }

    pub async fn device(&self, id: &str) -> Option<Value> {
        self.state.read().await.devices.get(id).cloned()
    }

    pub async fn requests(&self) -> Vec<String> {
        self.state.read().await.requests.clone()
    }

    /// Make the next request fail. `message` becomes the `{"error"}` body;
    /// without one the body is plain text.
    pub async fn fail_next(&self, status: StatusCode, message: Option<&str>) {
        self.state.write().await.fail_next = Some((status, message.map(str::to_string)));
    }

    pub async fn stop(self) {
        self.handle.abort();
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Record the request; return the injected failure, if any.
fn record(state: &mut MockBackendState, request: String) -> Option<Response> {
    state.requests.push(request);
    state.fail_next.take().map(|(status, message)| match message {
        Some(message) => error(status, &message),
        None => (status, "Internal Server Error").into_response(),
    })
}

fn merge(target: &mut Value, changes: Map<String, Value>) {
    if let Some(object) = target.as_object_mut() {
        for (key, value) in changes {
            object.insert(key, value);
        }
    }
}

async fn list_ids(State(state): State<Shared>) -> Response {
    let mut state = state.write().await;
    if let Some(failure) = record(&mut state, "GET ids".into()) {
        return failure;
    }
    let ids: Vec<&String> = state.devices.keys().collect();
    Json(json!(ids)).into_response()
}

async fn get_device(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.write().await;
    if let Some(failure) = record(&mut state, format!("GET {id}")) {
        return failure;
    }
    match state.devices.get(&id) {
        Some(device) => Json(device.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Device not found"),
    }
}

async fn create_device(State(state): State<Shared>, Json(device): Json<Value>) -> Response {
    let mut state = state.write().await;
    let id = device["id"].as_str().unwrap_or_default().to_string();
    if let Some(failure) = record(&mut state, format!("POST {id}")) {
        return failure;
    }
    if state.devices.contains_key(&id) {
        return error(StatusCode::BAD_REQUEST, "Device already exists");
    }
    state.devices.insert(id, device);
    StatusCode::CREATED.into_response()
}

async fn update_device(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(changes): Json<Map<String, Value>>,
) -> Response {
    let mut state = state.write().await;
    if let Some(failure) = record(&mut state, format!("PUT {id}")) {
        return failure;
    }
    match state.devices.get_mut(&id) {
        Some(device) => {
            merge(device, changes);
            StatusCode::OK.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Device not found"),
    }
}

async fn device_action(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(changes): Json<Map<String, Value>>,
) -> Response {
    let mut state = state.write().await;
    if let Some(failure) = record(&mut state, format!("ACTION {id}")) {
        return failure;
    }
    match state.devices.get_mut(&id) {
        Some(device) => {
            if !device["parameters"].is_object() {
                device["parameters"] = json!({});
            }
            merge(&mut device["parameters"], changes);
            StatusCode::OK.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Device not found"),
    }
}

async fn delete_device(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.write().await;
    if let Some(failure) = record(&mut state, format!("DELETE {id}")) {
        return failure;
    }
    match state.devices.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, "Device not found"),
    }
}
