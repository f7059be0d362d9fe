//! Edit-in-place and select inputs for the device panel.
//!
//! The browser has no widget state: "Edit" is a link that re-renders the
//! page with the field open, "Save" posts the form. Selects and checkboxes
//! post as soon as they change (`data-autosubmit`, wired up by the page
//! script).

use dioxus::prelude::*;

use crate::devices::schema::FieldKind;
use crate::forms::EditTarget;
use crate::inputs::{EditInPlace, Select, Validator};
use crate::ui::ViewState;

/// HTML input flavour for an editable field.
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    Text,
    Number { min: Option<f64>, max: Option<f64> },
    Time,
    Color,
}

impl InputKind {
    pub fn for_field(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Number { min, max } => InputKind::Number {
                min: Some(min),
                max: Some(max),
            },
            FieldKind::Reading => InputKind::Number {
                min: None,
                max: None,
            },
            FieldKind::Time => InputKind::Time,
            FieldKind::Color => InputKind::Color,
            FieldKind::Bool | FieldKind::Select(_) => InputKind::Text,
        }
    }

    fn html_type(&self) -> &'static str {
        match self {
            InputKind::Text | InputKind::Color => "text",
            InputKind::Number { .. } => "number",
            InputKind::Time => "time",
        }
    }

    fn min(&self) -> Option<String> {
        match self {
            InputKind::Number { min, .. } => min.map(|m| m.to_string()),
            _ => None,
        }
    }

    fn max(&self) -> Option<String> {
        match self {
            InputKind::Number { max, .. } => max.map(|m| m.to_string()),
            _ => None,
        }
    }

    fn pattern(&self) -> Option<String> {
        match self {
            InputKind::Color => Some("#[0-9A-Fa-f]{6}".to_string()),
            _ => None,
        }
    }
}

/// Render state of one edit-in-place input.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub value: String,
    pub editing: bool,
    pub disabled: bool,
    pub button_label: &'static str,
}

impl<R: Validator> From<&EditInPlace<R>> for FieldState {
    fn from(input: &EditInPlace<R>) -> Self {
        Self {
            value: input.value().to_string(),
            editing: input.is_editing(),
            disabled: input.is_disabled(),
            button_label: input.button_label(),
        }
    }
}

/// Hidden inputs that carry the view state through a form post.
#[component]
pub fn ViewFields(view: ViewState) -> Element {
    rsx! {
        input { r#type: "hidden", name: "group_by", value: view.group_by.as_str() }
        if view.form_open {
            input { r#type: "hidden", name: "form", value: "1" }
        }
    }
}

/// A value shown as text with an Edit button, or as an input with Save.
#[component]
pub fn EditableField(
    label: String,
    target: EditTarget,
    state: FieldState,
    kind: InputKind,
    /// Form action the Save button posts to
    action: String,
    view: ViewState,
) -> Element {
    let field = target.field.clone();

    rsx! {
        div { class: "field",
            strong { "{label}:" }
            if state.editing {
                form { method: "post", action: "{action}", "data-editing": "true",
                    ViewFields { view: view.clone() }
                    input { r#type: "hidden", name: "field", value: "{field}" }
                    input {
                        r#type: kind.html_type(),
                        name: "value",
                        value: "{state.value}",
                        min: kind.min(),
                        max: kind.max(),
                        pattern: kind.pattern(),
                        step: if matches!(kind, InputKind::Number { .. }) { "any" },
                        autofocus: true,
                    }
                    button { r#type: "submit", disabled: state.disabled, "{state.button_label}" }
                    a { href: view.href(), "Cancel" }
                }
            } else {
                span { class: "value", "{state.value}" }
                if state.disabled {
                    button { class: "secondary outline", disabled: true, "{state.button_label}" }
                } else {
                    a {
                        role: "button",
                        class: "secondary outline",
                        href: view.edit_href(&target),
                        "{state.button_label}"
                    }
                }
            }
        }
    }
}

/// Drop-down that posts its new value straight away.
#[component]
pub fn SelectField(select: Select, field: String, action: String, view: ViewState) -> Element {
    let current = select.value().to_string();

    rsx! {
        div { class: "field",
            strong { "{select.label}:" }
            form { method: "post", action: "{action}",
                ViewFields { view: view.clone() }
                input { r#type: "hidden", name: "field", value: "{field}" }
                select {
                    name: "value",
                    "aria-label": select.label,
                    "data-autosubmit": "true",
                    disabled: select.is_disabled(),
                    for opt in select.options.iter() {
                        option {
                            value: opt.value,
                            selected: opt.value == current,
                            "{opt.label}"
                        }
                    }
                }
                noscript {
                    button { r#type: "submit", "Save" }
                }
            }
        }
    }
}

/// Checkbox that posts the value it switches to.
#[component]
pub fn ToggleField(
    label: String,
    field: String,
    checked: bool,
    /// Value posted when the box is clicked
    next_value: String,
    disabled: bool,
    action: String,
    view: ViewState,
) -> Element {
    rsx! {
        div { class: "field",
            form { method: "post", action: "{action}",
                ViewFields { view: view.clone() }
                input { r#type: "hidden", name: "field", value: "{field}" }
                input { r#type: "hidden", name: "value", value: "{next_value}" }
                label {
                    input {
                        r#type: "checkbox",
                        role: "switch",
                        checked: checked,
                        disabled: disabled,
                        "data-autosubmit": "true",
                    }
                    " {label}"
                }
                noscript {
                    button { r#type: "submit", "Switch" }
                }
            }
        }
    }
}

/// Label and value that cannot be changed here.
#[component]
pub fn ReadOnlyField(label: String, value: String) -> Element {
    rsx! {
        div { class: "field",
            strong { "{label}:" }
            span { class: "value", "{value}" }
        }
    }
}
