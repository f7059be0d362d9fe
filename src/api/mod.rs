//! HTTP API handlers

use crate::bus::SharedBus;
use crate::dashboard::{group_devices, status_line, verify_new_id, DeviceGroup, GroupBy};
use crate::forms::{edit_field, set_parameter, toggle_status, NewDeviceForm, PanelChange};
use crate::refresh::AutoRefresh;
use crate::services::DeviceService;
use crate::ui::{render_dashboard, ViewState};
use anyhow::bail;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Redirect, Response,
    },
    Form, Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: DeviceService,
    pub refresh: Arc<AutoRefresh>,
    pub api_url: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: DeviceService, refresh: Arc<AutoRefresh>, api_url: &str) -> Self {
        Self {
            service,
            refresh,
            api_url: api_url.to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn bus(&self) -> &SharedBus {
        self.service.bus()
    }
}

/// Posted form fields in submission order.
type Fields = Vec<(String, String)>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// General status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub git_sha: &'static str,
    pub uptime_secs: u64,
    pub api_url: String,
    pub refresh_interval_secs: u64,
    pub fetching: usize,
    pub mutating: usize,
    pub bus_subscribers: usize,
}

/// GET /status - Service health check
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let cache = state.service.cache();
    Json(StatusResponse {
        service: "home-device-dashboard",
        version: env!("HDD_VERSION"),
        git_sha: env!("HDD_GIT_SHA"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        api_url: state.api_url.clone(),
        refresh_interval_secs: state.refresh.interval().as_secs(),
        fetching: cache.is_fetching(),
        mutating: cache.is_mutating(),
        bus_subscribers: state.bus().subscriber_count(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupQuery {
    pub group_by: Option<String>,
}

/// Grouped device list, as the dashboard shows it
#[derive(Serialize)]
pub struct DashboardResponse {
    pub status: String,
    pub group_by: GroupBy,
    pub groups: Vec<DeviceGroup>,
}

/// GET /dashboard - Grouped devices as JSON
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> impl IntoResponse {
    let group_by = GroupBy::parse(query.group_by.as_deref());
    match state.service.load_devices().await {
        Ok(devices) => {
            let cache = state.service.cache();
            (
                StatusCode::OK,
                Json(DashboardResponse {
                    status: status_line(cache.activity(), cache.last_updated().await),
                    group_by,
                    groups: group_devices(&devices, group_by),
                }),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /events - SSE stream of bus events
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.bus().subscribe();

    // Pages only need to hear about device changes
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        match result {
            Ok(event) if event.changes_devices() => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().data(json))),
                Err(_) => None,
            },
            Ok(_) => None,
            Err(_) => None, // Skip lagged messages
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

// =============================================================================
// Page form handlers
// =============================================================================

fn form_value<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn view_from_fields(fields: &Fields) -> ViewState {
    ViewState::from_params(form_value(fields, "group_by"), form_value(fields, "form"))
}

/// Back to the page, with an alert if the change was refused.
fn back_to(view: &ViewState, result: anyhow::Result<()>) -> Redirect {
    match result {
        Ok(()) => Redirect::to(&view.href()),
        Err(e) => Redirect::to(&view.error_href(&e.to_string())),
    }
}

/// POST /ui/activity - User is interacting with the page
pub async fn activity_handler(State(state): State<AppState>) -> StatusCode {
    state.refresh.touch();
    StatusCode::NO_CONTENT
}

/// POST /ui/reload - Invalidate everything and fetch it again
pub async fn reload_handler(State(state): State<AppState>, Form(fields): Form<Fields>) -> Redirect {
    let view = view_from_fields(&fields);
    state.refresh.touch();
    let result = state.service.refresh().await.map(|_| ()).map_err(Into::into);
    back_to(&view, result)
}

/// POST /ui/devices - Add a device from the new-device form
pub async fn create_device_handler(
    State(state): State<AppState>,
    Form(fields): Form<Fields>,
) -> Response {
    let view = view_from_fields(&fields);
    let draft = NewDeviceForm::from_fields(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let known = match state.service.load_devices().await {
        Ok(devices) => devices,
        Err(e) => {
            tracing::warn!("Cannot check new device id: {}", e);
            let page = render_dashboard(&state, view, None, Some(e.to_string()), Some(draft)).await;
            return (StatusCode::BAD_GATEWAY, page).into_response();
        }
    };

    let device = match draft.submit(|id| verify_new_id(&known, id)) {
        Ok(device) => device,
        Err(e) => {
            tracing::debug!(id = %draft.id, "New device refused: {}", e);
            let page = render_dashboard(&state, view, None, Some(e.to_string()), Some(draft)).await;
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    match state.service.create_device(&device).await {
        Ok(()) => Redirect::to(&view.with_form_open(false).href()).into_response(),
        Err(e) => {
            let page = render_dashboard(&state, view, None, Some(e.to_string()), Some(draft)).await;
            (StatusCode::BAD_GATEWAY, page).into_response()
        }
    }
}

/// POST /ui/devices/{id}/update - Save an edited name or room
pub async fn update_device_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<Fields>,
) -> Redirect {
    let view = view_from_fields(&fields);
    let result = async {
        let field = form_value(&fields, "field").unwrap_or_default();
        if !matches!(field, "name" | "room") {
            bail!("Cannot update field {field:?}");
        }
        let device = state.service.device(&id).await?;
        let value = form_value(&fields, "value").unwrap_or_default();
        match edit_field(&device, field, value)? {
            PanelChange::Update(update) => state.service.update_device(&update).await?,
            PanelChange::Action(action) => state.service.device_action(&action).await?,
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;
    back_to(&view, result)
}

/// POST /ui/devices/{id}/status - Flip a device between its two states
pub async fn status_device_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<Fields>,
) -> Redirect {
    let view = view_from_fields(&fields);
    let result = async {
        let device = state.service.device(&id).await?;
        state.service.update_device(&toggle_status(&device)).await?;
        Ok::<(), anyhow::Error>(())
    }
    .await;
    back_to(&view, result)
}

/// POST /ui/devices/{id}/action - Change one type-specific parameter
pub async fn action_device_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<Fields>,
) -> Redirect {
    let view = view_from_fields(&fields);
    let result = async {
        let device = state.service.device(&id).await?;
        let key = form_value(&fields, "field").unwrap_or_default();
        let raw = form_value(&fields, "value").unwrap_or_default();
        let action = set_parameter(&device, key, raw)?;
        state.service.device_action(&action).await?;
        Ok::<(), anyhow::Error>(())
    }
    .await;
    back_to(&view, result)
}

/// POST /ui/devices/{id}/delete - Remove a device
pub async fn delete_device_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<Fields>,
) -> Redirect {
    let view = view_from_fields(&fields);
    let result = state.service.delete_device(&id).await.map_err(Into::into);
    back_to(&view, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{create_bus, BusEvent};
    use crate::client::ApiError;
    use crate::router::router;
    use crate::services::testing::{device, MemoryBackend};
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn app(backend: Arc<MemoryBackend>) -> axum::Router {
        let service = DeviceService::new(backend, create_bus());
        let refresh = Arc::new(AutoRefresh::new(service.clone(), Duration::from_secs(60)));
        router(AppState::new(service, refresh, "http://backend.test"))
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn dashboard_page_lists_devices() {
        let backend = Arc::new(MemoryBackend::with_devices(vec![
            device("l1", "light", "kitchen"),
            device("c1", "curtain", "bedroom"),
        ]));
        let response = app(backend)
            .oneshot(Request::get("/?group_by=room").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Kitchen"));
        assert!(html.contains("Bedroom"));
        assert!(html.contains("Group by type"));
    }

    #[tokio::test]
    async fn dashboard_json_reports_backend_errors() {
        let backend = Arc::new(MemoryBackend::default());
        backend.fail(ApiError::Server {
            status: 500,
            message: "Database offline".into(),
        });
        let response = app(backend)
            .oneshot(Request::get("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.contains("Database offline"));
    }

    #[tokio::test]
    async fn create_redirects_and_closes_form() {
        let backend = Arc::new(MemoryBackend::default());
        let response = app(backend.clone())
            .oneshot(post(
                "/ui/devices",
                "group_by=room&form=1&id=wh1&name=Boiler&room=utility&type=water_heater&param_target_temperature=55",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/?group_by=room");

        let devices = backend.devices.lock().unwrap();
        let created = devices.get("wh1").unwrap();
        assert_eq!(created.name, "Boiler");
        assert_eq!(created.param_text("target_temperature"), "55");
    }

    #[tokio::test]
    async fn duplicate_id_re_renders_the_form() {
        let backend = Arc::new(MemoryBackend::with_devices(vec![device("l1", "light", "kitchen")]));
        let response = app(backend.clone())
            .oneshot(post("/ui/devices", "form=1&id=l1&name=Lamp&room=den&type=light"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains("ID must be unique, this ID is already taken"));
        assert!(html.contains("value=\"Lamp\""));
        assert!(!backend.calls().iter().any(|c| c.starts_with("POST")));
    }

    #[tokio::test]
    async fn status_toggle_flips_the_device() {
        let backend = Arc::new(MemoryBackend::with_devices(vec![device("l1", "light", "kitchen")]));
        let response = app(backend.clone())
            .oneshot(post("/ui/devices/l1/status", "field=status&value=on"))
            .await
            .unwrap();
        assert_eq!(location(&response), "/");
        assert_eq!(backend.devices.lock().unwrap()["l1"].status, "on");
    }

    #[tokio::test]
    async fn invalid_parameter_redirects_with_error() {
        let backend = Arc::new(MemoryBackend::with_devices(vec![device(
            "ac1",
            "air_conditioner",
            "bedroom",
        )]));
        let response = app(backend.clone())
            .oneshot(post("/ui/devices/ac1/action", "group_by=room&field=temperature&value=99"))
            .await
            .unwrap();
        let to = location(&response);
        assert!(to.starts_with("/?group_by=room&error="), "{to}");
        assert!(!backend.calls().iter().any(|c| c.starts_with("ACTION")));
    }

    #[tokio::test]
    async fn update_only_accepts_metadata_fields() {
        let backend = Arc::new(MemoryBackend::with_devices(vec![device("l1", "light", "kitchen")]));
        let app = app(backend.clone());

        let response = app
            .clone()
            .oneshot(post("/ui/devices/l1/update", "field=room&value=+Hallway+"))
            .await
            .unwrap();
        assert_eq!(location(&response), "/");
        assert_eq!(backend.devices.lock().unwrap()["l1"].room, "Hallway");

        let response = app
            .oneshot(post("/ui/devices/l1/update", "field=brightness&value=10"))
            .await
            .unwrap();
        assert!(location(&response).contains("error="));
    }

    #[tokio::test]
    async fn delete_removes_the_device() {
        let backend = Arc::new(MemoryBackend::with_devices(vec![device("l 1", "light", "kitchen")]));
        let response = app(backend.clone())
            .oneshot(post("/ui/devices/l%201/delete", ""))
            .await
            .unwrap();
        assert_eq!(location(&response), "/");
        assert!(backend.devices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn activity_is_acknowledged() {
        let backend = Arc::new(MemoryBackend::default());
        let response = app(backend)
            .oneshot(Request::post("/ui/activity").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn reload_keeps_open_form() {
        let backend = Arc::new(MemoryBackend::with_devices(vec![device("l1", "light", "hall")]));
        let response = app(backend)
            .oneshot(post("/ui/reload", "group_by=room&form=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/?group_by=room&form=1");
    }

    #[tokio::test]
    async fn event_stream_carries_only_device_changes() {
        let service = DeviceService::new(Arc::new(MemoryBackend::default()), create_bus());
        let refresh = Arc::new(AutoRefresh::new(service.clone(), Duration::from_secs(60)));
        let state = AppState::new(service, refresh, "http://backend.test");
        let bus = state.bus().clone();

        let response = events_handler(State(state)).await.into_response();
        bus.publish(BusEvent::BackendError {
            message: "Database offline".into(),
        });
        bus.publish(BusEvent::DeviceRemoved { id: "l1".into() });

        let mut body = response.into_body().into_data_stream();
        let chunk = tokio::time::timeout(Duration::from_secs(1), body.next())
            .await
            .expect("no event within a second")
            .unwrap()
            .unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();
        assert!(text.contains("DeviceRemoved"));
        assert!(!text.contains("Database offline"));
    }
}
