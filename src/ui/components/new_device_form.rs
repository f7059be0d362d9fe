//! "Add device" form.
//!
//! Settings for every type are rendered, one fieldset each. The page script
//! shows and enables only the fieldset of the selected type, so the others
//! are not posted.

use dioxus::prelude::*;

use super::inputs::{InputKind, ViewFields};
use crate::devices::schema::{self, Access, FieldKind, FieldSpec};
use crate::devices::DeviceType;
use crate::forms::{NewDeviceForm, PARAM_PREFIX};
use crate::ui::ViewState;

fn setting_input(draft: &NewDeviceForm, device_type: &DeviceType, spec: &'static FieldSpec) -> Element {
    let name = format!("{PARAM_PREFIX}{}", spec.key);
    let raw = draft.raw_parameter(spec.key).to_string();
    let placeholder = schema::default_text(device_type, spec.key);

    match spec.kind {
        FieldKind::Bool => {
            let checked = draft.device_type.as_ref() == Some(device_type)
                && draft.parameters.get(spec.key).and_then(|v| v.as_bool()) == Some(true);
            rsx! {
                label {
                    input { r#type: "checkbox", role: "switch", name: "{name}", checked: checked }
                    " {spec.label}"
                }
            }
        }
        FieldKind::Select(options) => {
            let default_label = format!("Default ({})", placeholder.unwrap_or_default());
            rsx! {
                label {
                    "{spec.label}"
                    select { name: "{name}",
                        option { value: "", "{default_label}" }
                        for opt in options.iter() {
                            option { value: opt.value, selected: raw == opt.value, "{opt.label}" }
                        }
                    }
                }
            }
        }
        _ => {
            let kind = InputKind::for_field(spec.kind);
            let (html_type, min, max) = match kind {
                InputKind::Number { min, max } => {
                    ("number", min.map(|m| m.to_string()), max.map(|m| m.to_string()))
                }
                InputKind::Time => ("time", None, None),
                InputKind::Text | InputKind::Color => ("text", None, None),
            };
            rsx! {
                label {
                    "{spec.label}"
                    input {
                        r#type: html_type,
                        name: "{name}",
                        value: "{raw}",
                        placeholder: placeholder,
                        min: min,
                        max: max,
                    }
                }
            }
        }
    }
}

fn type_settings(draft: &NewDeviceForm, device_type: &DeviceType) -> Element {
    let selected = draft.device_type.as_ref() == Some(device_type);
    let settings: Vec<Element> = schema::fields(device_type)
        .iter()
        .filter(|f| f.access != Access::ReadOnly)
        .map(|spec| setting_input(draft, device_type, spec))
        .collect();
    let legend = format!("{} settings", device_type.label());
    let status = format!("Starts {}", device_type.default_status());

    rsx! {
        fieldset {
            "data-device-type": device_type.as_str(),
            hidden: !selected,
            disabled: !selected,
            legend { "{legend}" }
            small { "{status}" }
            for setting in settings {
                {setting}
            }
        }
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct NewDeviceFormViewProps {
    /// Values to re-fill after a refused submission
    #[props(default)]
    pub draft: NewDeviceForm,
    /// Requests are in flight
    pub disabled: bool,
    pub view: ViewState,
}

#[component]
pub fn NewDeviceFormView(props: NewDeviceFormViewProps) -> Element {
    let draft = props.draft;
    let chosen = draft
        .device_type
        .as_ref()
        .map(|t| t.as_str().to_string())
        .unwrap_or_default();
    let type_options: Vec<(String, String)> = DeviceType::KNOWN
        .iter()
        .map(|t| (t.as_str().to_string(), t.label().to_string()))
        .collect();
    let type_fieldsets: Vec<Element> = DeviceType::KNOWN
        .iter()
        .map(|t| type_settings(&draft, t))
        .collect();

    rsx! {
        article { id: "new-device",
            h2 { "Add device" }
            form { method: "post", action: "/ui/devices",
                ViewFields { view: props.view.clone() }
                div { class: "grid",
                    label { "ID"
                        input { name: "id", value: "{draft.id}", required: true }
                    }
                    label { "Name"
                        input { name: "name", value: "{draft.name}", required: true }
                    }
                    label { "Room"
                        input { name: "room", value: "{draft.room}", required: true }
                    }
                    label { "Type"
                        select { id: "new-device-type", name: "type", required: true,
                            option { value: "", "Choose a type" }
                            for (value, label) in type_options {
                                option {
                                    selected: chosen == value,
                                    value: "{value}",
                                    "{label}"
                                }
                            }
                        }
                    }
                }
                for fieldset in type_fieldsets {
                    {fieldset}
                }
                button { r#type: "submit", disabled: props.disabled, "Add device" }
            }
        }
    }
}
