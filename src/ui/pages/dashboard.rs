//! Dashboard page component.
//!
//! Devices grouped by type or room, the add-device form and the controls
//! for reloading and regrouping.

use dioxus::prelude::*;

use crate::dashboard::DeviceGroup;
use crate::forms::{EditTarget, NewDeviceForm};
use crate::ui::components::inputs::ViewFields;
use crate::ui::components::{DeviceCard, ErrorAlert, Layout, NewDeviceFormView};
use crate::ui::ViewState;

/// Client-side JavaScript for the Dashboard page.
const DASHBOARD_SCRIPT: &str = r#"
document.querySelectorAll('[data-autosubmit]').forEach(el => {
    el.addEventListener('change', () => el.form.submit());
});
document.querySelectorAll('form[data-confirm]').forEach(form => {
    form.addEventListener('submit', (e) => {
        if (!confirm(form.dataset.confirm)) e.preventDefault();
    });
});

const typeSelect = document.getElementById('new-device-type');
function showTypeSettings() {
    document.querySelectorAll('fieldset[data-device-type]').forEach(fs => {
        const on = fs.dataset.deviceType === typeSelect.value;
        fs.hidden = !on;
        fs.disabled = !on;
    });
}
if (typeSelect) {
    typeSelect.addEventListener('change', showTypeSettings);
    showTypeSettings();
}

// User activity restarts the server's idle refresh timer.
let lastActivity = 0;
function reportActivity() {
    const now = Date.now();
    if (now - lastActivity < 5000) return;
    lastActivity = now;
    fetch('/ui/activity', { method: 'POST' }).catch(() => {});
}
['mousemove', 'keydown'].forEach(t => document.addEventListener(t, reportActivity));

// Every event is a device change. Reload unless the user is typing into a form.
function busyEditing() {
    return document.querySelector('[data-editing]') || document.getElementById('new-device');
}
const es = new EventSource('/events');
es.onmessage = () => {
    if (!busyEditing()) location.reload();
};
es.onerror = () => console.warn('SSE disconnected');
"#;

/// Everything the dashboard page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// "Loading..." or when data was last fetched
    pub status: String,
    pub busy: bool,
    pub groups: Vec<DeviceGroup>,
    /// Set when the device list could not be loaded
    pub load_error: Option<String>,
    /// Message from a refused form post
    pub alert: Option<String>,
    pub edit: Option<EditTarget>,
    pub draft: NewDeviceForm,
    pub view: ViewState,
}

/// Dashboard page component.
#[component]
pub fn DashboardPage(page: DashboardView) -> Element {
    let view = page.view.clone();
    let regroup_href = view.with_group_by(view.group_by.toggle()).href();
    let regroup_label = view.group_by.button_label();
    let form_href = view.with_form_open(!view.form_open).href();
    let form_label = if view.form_open { "Cancel" } else { "Add device" };
    let no_devices = page.load_error.is_none() && page.groups.is_empty();

    rsx! {
        Layout {
            title: "Devices".to_string(),
            scripts: Some(DASHBOARD_SCRIPT.to_string()),

            hgroup {
                h1 { "Devices" }
                p { "aria-busy": "{page.busy}", "{page.status}" }
            }

            if let Some(message) = page.alert.clone() {
                ErrorAlert { message, dismiss_href: view.href() }
            }

            div { class: "controls",
                form { method: "post", action: "/ui/reload",
                    ViewFields { view: view.clone() }
                    button { r#type: "submit", class: "secondary", disabled: page.busy, "Reload" }
                }
                a { role: "button", class: "secondary outline", href: "{regroup_href}", "{regroup_label}" }
                a { role: "button", class: "outline", href: "{form_href}", "{form_label}" }
            }

            if view.form_open {
                NewDeviceFormView {
                    draft: page.draft.clone(),
                    disabled: page.busy,
                    view: view.clone(),
                }
            }

            if let Some(error) = page.load_error.clone() {
                article {
                    h2 { "Error loading data" }
                    p { class: "status-err", "{error}" }
                }
            } else {
                for group in page.groups.iter() {
                    section {
                        h2 { "{group.label}" }
                        div { class: "device-grid",
                            for device in group.devices.iter() {
                                DeviceCard {
                                    device: device.clone(),
                                    edit: page.edit.clone(),
                                    busy: page.busy,
                                    view: view.clone(),
                                }
                            }
                        }
                    }
                }
            }

            if no_devices {
                p { "No devices yet." }
            }
        }
    }
}
