//! Route table.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{api, ui};

pub fn router(state: api::AppState) -> Router {
    Router::new()
        // Health check
        .route("/status", get(api::status_handler))
        // Device data
        .route("/dashboard", get(api::dashboard_handler))
        // Event stream (SSE)
        .route("/events", get(api::events_handler))
        // Web UI routes
        .route("/", get(ui::dashboard_page))
        .route("/ui/activity", post(api::activity_handler))
        .route("/ui/reload", post(api::reload_handler))
        .route("/ui/devices", post(api::create_device_handler))
        .route("/ui/devices/{id}/update", post(api::update_device_handler))
        .route("/ui/devices/{id}/status", post(api::status_device_handler))
        .route("/ui/devices/{id}/action", post(api::action_device_handler))
        .route("/ui/devices/{id}/delete", post(api::delete_device_handler))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
