//! Web UI: the device dashboard, rendered on the server with Dioxus SSR.
//!
//! The page is plain HTML forms. Which field is being edited, whether the
//! add-device form is open and the grouping all live in the query string,
//! so every form post can redirect back to the same view.

pub mod components;
pub mod pages;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
};
use dioxus::prelude::*;
use serde::Deserialize;

use crate::api::AppState;
use crate::dashboard::{group_devices, status_line, GroupBy};
use crate::forms::{EditTarget, NewDeviceForm};
use pages::{DashboardPage, DashboardView};

/// Query params for the dashboard page
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub group_by: Option<String>,
    pub form: Option<String>,
    pub edit: Option<String>,
    pub error: Option<String>,
}

/// What the page looks like apart from the device data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub group_by: GroupBy,
    pub form_open: bool,
}

impl ViewState {
    pub fn from_params(group_by: Option<&str>, form: Option<&str>) -> Self {
        Self {
            group_by: GroupBy::parse(group_by),
            form_open: matches!(form, Some("1" | "open" | "true")),
        }
    }

    pub fn with_group_by(&self, group_by: GroupBy) -> Self {
        Self {
            group_by,
            ..self.clone()
        }
    }

    pub fn with_form_open(&self, form_open: bool) -> Self {
        Self {
            form_open,
            ..self.clone()
        }
    }

    fn params(&self) -> Vec<String> {
        let mut params = Vec::new();
        if self.group_by != GroupBy::default() {
            params.push(format!("group_by={}", self.group_by.as_str()));
        }
        if self.form_open {
            params.push("form=1".to_string());
        }
        params
    }

    /// Link to this view.
    pub fn href(&self) -> String {
        to_href(self.params())
    }

    /// Link to this view with one field in editing mode.
    pub fn edit_href(&self, target: &EditTarget) -> String {
        let mut params = self.params();
        params.push(format!("edit={}", urlencoding::encode(&target.to_query())));
        to_href(params)
    }

    /// Link to this view showing an error alert.
    pub fn error_href(&self, message: &str) -> String {
        let mut params = self.params();
        params.push(format!("error={}", urlencoding::encode(message)));
        to_href(params)
    }
}

fn to_href(params: Vec<String>) -> String {
    if params.is_empty() {
        "/".to_string()
    } else {
        format!("/?{}", params.join("&"))
    }
}

/// GET / - Device dashboard
pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    let view = ViewState::from_params(query.group_by.as_deref(), query.form.as_deref());
    let edit = query.edit.as_deref().and_then(EditTarget::parse);
    render_dashboard(&state, view, edit, query.error, None).await
}

/// Render the dashboard. `draft` re-fills a refused add-device form.
pub async fn render_dashboard(
    state: &AppState,
    view: ViewState,
    edit: Option<EditTarget>,
    alert: Option<String>,
    draft: Option<NewDeviceForm>,
) -> Html<String> {
    let service = &state.service;
    let (groups, load_error) = match service.load_devices().await {
        Ok(devices) => (group_devices(&devices, view.group_by), None),
        Err(e) => {
            tracing::warn!("Dashboard could not load devices: {}", e);
            (Vec::new(), Some(e.to_string()))
        }
    };

    let view = if draft.is_some() {
        view.with_form_open(true)
    } else {
        view
    };
    let cache = service.cache();
    let page = DashboardView {
        status: status_line(cache.activity(), cache.last_updated().await),
        busy: service.is_busy(),
        groups,
        load_error,
        alert,
        edit,
        draft: draft.unwrap_or_default(),
        view,
    };

    let html = dioxus::ssr::render_element(rsx! { DashboardPage { page } });
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"dark\">\n{}</html>",
        html
    ))
}
