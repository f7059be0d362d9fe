//! Device panel: metadata, status switch, type-specific parameters.

use dioxus::prelude::*;

use super::inputs::{
    EditableField, FieldState, InputKind, ReadOnlyField, SelectField, ToggleField, ViewFields,
};
use crate::devices::schema::{self, Access, FieldKind, FieldSpec};
use crate::devices::Device;
use crate::forms::{confirm_removal_prompt, EditTarget};
use crate::inputs::{
    ColorInput, ColorRule, EditInPlace, NumberInput, NumberRule, Select, TextInput, TextRule,
    TimeInput, TimeRule, Validator,
};
use crate::ui::ViewState;

/// `/ui/devices/{id}/{operation}` with the id percent-encoded.
pub fn device_action_url(device_id: &str, operation: &str) -> String {
    format!("/ui/devices/{}/{}", urlencoding::encode(device_id), operation)
}

fn open_editor<R: Validator>(
    input: EditInPlace<R>,
    target: &EditTarget,
    edit: Option<&EditTarget>,
    busy: bool,
) -> FieldState {
    let input = input.disabled(busy);
    let input = if edit == Some(target) {
        input.editing()
    } else {
        input
    };
    FieldState::from(&input)
}

fn display_value(device: &Device, spec: &FieldSpec) -> String {
    match spec.kind {
        FieldKind::Bool => {
            if device.param_bool(spec.key) {
                "Yes".to_string()
            } else {
                "No".to_string()
            }
        }
        _ => {
            let text = device.param_text(spec.key);
            if text.is_empty() {
                "-".to_string()
            } else {
                text
            }
        }
    }
}

fn parameter_field(
    device: &Device,
    spec: &'static FieldSpec,
    edit: Option<&EditTarget>,
    busy: bool,
    view: &ViewState,
) -> Element {
    let action = device_action_url(&device.id, "action");
    let target = EditTarget::new(&device.id, spec.key);
    let text = device.param_text(spec.key);
    let label = spec.label.to_string();

    if spec.access != Access::Action {
        return rsx! {
            ReadOnlyField { label, value: display_value(device, spec) }
        };
    }

    let state = match spec.kind {
        FieldKind::Bool => {
            let checked = device.param_bool(spec.key);
            return rsx! {
                ToggleField {
                    label,
                    field: spec.key.to_string(),
                    checked,
                    next_value: (!checked).to_string(),
                    disabled: busy,
                    action,
                    view: view.clone(),
                }
            };
        }
        FieldKind::Select(options) => {
            let select = Select::new(spec.label, options, &text).disabled(busy);
            return rsx! {
                SelectField { select, field: spec.key.to_string(), action, view: view.clone() }
            };
        }
        FieldKind::Number { min, max } => open_editor(
            NumberInput::new(NumberRule::between(min, max), text),
            &target,
            edit,
            busy,
        ),
        FieldKind::Reading => open_editor(
            NumberInput::new(NumberRule::default(), text),
            &target,
            edit,
            busy,
        ),
        FieldKind::Time => open_editor(TimeInput::new(TimeRule, text), &target, edit, busy),
        FieldKind::Color => open_editor(ColorInput::new(ColorRule, text), &target, edit, busy),
    };

    rsx! {
        EditableField {
            label,
            target,
            state,
            kind: InputKind::for_field(spec.kind),
            action,
            view: view.clone(),
        }
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct DeviceCardProps {
    pub device: Device,
    /// Field currently in editing mode, on any device
    #[props(default)]
    pub edit: Option<EditTarget>,
    /// Requests are in flight; inputs are disabled
    pub busy: bool,
    pub view: ViewState,
}

/// One device with everything that can be changed about it.
#[component]
pub fn DeviceCard(props: DeviceCardProps) -> Element {
    let DeviceCardProps {
        device,
        edit,
        busy,
        view,
    } = props;
    let update_url = device_action_url(&device.id, "update");
    let name_target = EditTarget::new(&device.id, "name");
    let room_target = EditTarget::new(&device.id, "room");
    let name = open_editor(
        TextInput::new(TextRule, device.name.clone()),
        &name_target,
        edit.as_ref(),
        busy,
    );
    let room = open_editor(
        TextInput::new(TextRule, device.room.clone()),
        &room_target,
        edit.as_ref(),
        busy,
    );

    let known = device.device_type.is_known();
    let parameters: Vec<Element> = schema::visible_fields(&device)
        .into_iter()
        .map(|spec| parameter_field(&device, spec, edit.as_ref(), busy, &view))
        .collect();
    let prompt = confirm_removal_prompt(&device);
    let caption = format!("{} · {}", device.id, device.device_type.label());

    rsx! {
        article { class: "device-card",
            header {
                EditableField {
                    label: "Name".to_string(),
                    target: name_target,
                    state: name,
                    kind: InputKind::Text,
                    action: update_url.clone(),
                    view: view.clone(),
                }
                small { "{caption}" }
            }
            EditableField {
                label: "Room".to_string(),
                target: room_target,
                state: room,
                kind: InputKind::Text,
                action: update_url,
                view: view.clone(),
            }
            ToggleField {
                label: device.device_type.status_caption().to_string(),
                field: "status".to_string(),
                checked: device.is_active(),
                next_value: device.next_status().to_string(),
                disabled: busy,
                action: device_action_url(&device.id, "status"),
                view: view.clone(),
            }
            if known {
                for field in parameters {
                    {field}
                }
            } else {
                p { class: "status-err", "Unknown device type" }
            }
            footer {
                form {
                    method: "post",
                    action: device_action_url(&device.id, "delete"),
                    "data-confirm": "{prompt}",
                    ViewFields { view: view.clone() }
                    button { r#type: "submit", class: "secondary", disabled: busy, "Remove" }
                }
            }
        }
    }
}
