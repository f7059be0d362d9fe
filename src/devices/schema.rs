//! Per-type parameter schema.
//!
//! Which parameters each device type has, what a new device starts with,
//! and the ranges the dashboard enforces before sending an action.

use serde_json::{json, Number, Value};

use super::{Device, DeviceType, Parameters};
use crate::inputs::{
    find_option, ColorRule, InputError, NumberRule, SelectOption, TimeRule, Validator,
};

/// Minimum temperature (celsius) for water heater
pub const MIN_WATER_TEMP: f64 = 49.0;
/// Maximum temperature (celsius) for water heater
pub const MAX_WATER_TEMP: f64 = 60.0;
/// Minimum temperature (celsius) for air conditioner
pub const MIN_AC_TEMP: f64 = 16.0;
/// Maximum temperature (celsius) for air conditioner
pub const MAX_AC_TEMP: f64 = 30.0;
pub const MIN_BRIGHTNESS: f64 = 0.0;
pub const MAX_BRIGHTNESS: f64 = 100.0;

pub const DEFAULT_WATER_TEMP: i64 = 60;
pub const DEFAULT_TIMER_ENABLED: bool = false;
pub const DEFAULT_START_TIME: &str = "06:30";
pub const DEFAULT_STOP_TIME: &str = "08:00";

pub const DEFAULT_AC_TEMP: i64 = 24;
pub const DEFAULT_AC_MODE: &str = "cool";
pub const DEFAULT_AC_FAN: &str = "low";
pub const DEFAULT_AC_SWING: &str = "off";

pub const DEFAULT_DIMMABLE: bool = false;
pub const DEFAULT_BRIGHTNESS: i64 = 80;
pub const DEFAULT_DYNAMIC_COLOR: bool = false;
pub const DEFAULT_LIGHT_COLOR: &str = "#FFFFFF";

pub const DEFAULT_AUTO_LOCK_ENABLED: bool = false;
pub const DEFAULT_BATTERY: i64 = 100;

pub const DEFAULT_POSITION: i64 = 100;

pub const AC_MODES: &[SelectOption] = &[
    SelectOption::new("Cooling", "cool"),
    SelectOption::new("Heating", "heat"),
    SelectOption::new("Fan", "fan"),
];

pub const AC_FAN_SPEEDS: &[SelectOption] = &[
    SelectOption::new("Off", "off"),
    SelectOption::new("Low", "low"),
    SelectOption::new("Medium", "medium"),
    SelectOption::new("High", "high"),
];

pub const AC_SWING: &[SelectOption] = &[
    SelectOption::new("Off", "off"),
    SelectOption::new("On", "on"),
    SelectOption::new("Auto", "auto"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number { min: f64, max: f64 },
    /// Number the server reports; no range is enforced.
    Reading,
    Bool,
    Time,
    Color,
    Select(&'static [SelectOption]),
}

/// Who may change a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Sent as a device action from the device panel.
    Action,
    /// Chosen in the new-device form only.
    CreateOnly,
    /// Reported by the backend.
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub access: Access,
}

const fn field(key: &'static str, label: &'static str, kind: FieldKind, access: Access) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind,
        access,
    }
}

const WATER_HEATER_FIELDS: &[FieldSpec] = &[
    field("temperature", "Temperature", FieldKind::Reading, Access::ReadOnly),
    field(
        "target_temperature",
        "Target temperature",
        FieldKind::Number {
            min: MIN_WATER_TEMP,
            max: MAX_WATER_TEMP,
        },
        Access::Action,
    ),
    field("timer_enabled", "Timer enabled", FieldKind::Bool, Access::Action),
    field("scheduled_on", "Start time", FieldKind::Time, Access::Action),
    field("scheduled_off", "Stop time", FieldKind::Time, Access::Action),
    field("is_heating", "Heating", FieldKind::Bool, Access::ReadOnly),
];

const LIGHT_FIELDS: &[FieldSpec] = &[
    field("is_dimmable", "Is dimmable", FieldKind::Bool, Access::CreateOnly),
    field(
        "brightness",
        "Brightness",
        FieldKind::Number {
            min: MIN_BRIGHTNESS,
            max: MAX_BRIGHTNESS,
        },
        Access::Action,
    ),
    field("dynamic_color", "Dynamic color", FieldKind::Bool, Access::CreateOnly),
    field("color", "Color", FieldKind::Color, Access::Action),
];

const AIR_CONDITIONER_FIELDS: &[FieldSpec] = &[
    field(
        "temperature",
        "Temperature",
        FieldKind::Number {
            min: MIN_AC_TEMP,
            max: MAX_AC_TEMP,
        },
        Access::Action,
    ),
    field("mode", "Mode", FieldKind::Select(AC_MODES), Access::Action),
    field("fan_speed", "Fan", FieldKind::Select(AC_FAN_SPEEDS), Access::Action),
    field("swing", "Swing", FieldKind::Select(AC_SWING), Access::Action),
];

const DOOR_LOCK_FIELDS: &[FieldSpec] = &[
    field(
        "auto_lock_enabled",
        "Auto-lock enabled",
        FieldKind::Bool,
        Access::CreateOnly,
    ),
    field("battery_level", "Battery level", FieldKind::Reading, Access::ReadOnly),
];

const CURTAIN_FIELDS: &[FieldSpec] = &[field(
    "position",
    "Position",
    FieldKind::Reading,
    Access::ReadOnly,
)];

/// Parameter table for a device type. Unknown types have no parameters.
pub fn fields(device_type: &DeviceType) -> &'static [FieldSpec] {
    match device_type {
        DeviceType::WaterHeater => WATER_HEATER_FIELDS,
        DeviceType::Light => LIGHT_FIELDS,
        DeviceType::AirConditioner => AIR_CONDITIONER_FIELDS,
        DeviceType::DoorLock => DOOR_LOCK_FIELDS,
        DeviceType::Curtain => CURTAIN_FIELDS,
        DeviceType::Unknown(_) => &[],
    }
}

pub fn field_spec(device_type: &DeviceType, key: &str) -> Option<&'static FieldSpec> {
    fields(device_type).iter().find(|f| f.key == key)
}

/// Keys a new device of this type may be created with.
pub fn allowed_keys(device_type: &DeviceType) -> Vec<&'static str> {
    match device_type {
        DeviceType::WaterHeater => vec![
            "temperature",
            "target_temperature",
            "timer_enabled",
            "scheduled_on",
            "scheduled_off",
        ],
        DeviceType::Light => vec!["brightness", "color", "is_dimmable", "dynamic_color"],
        DeviceType::AirConditioner => vec!["temperature", "mode", "fan_speed", "swing"],
        DeviceType::DoorLock => vec!["auto_lock_enabled", "battery_level"],
        DeviceType::Curtain => vec!["position"],
        DeviceType::Unknown(_) => Vec::new(),
    }
}

fn or_default(params: &mut Parameters, key: &str, default: Value) {
    params.entry(key.to_string()).or_insert(default);
}

fn flag(params: &Parameters, key: &str) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Fill in defaults for a new device and drop keys that do not belong to
/// its type. The draft may hold leftovers from a previously selected type.
pub fn clean_parameters(device_type: &DeviceType, draft: &Parameters) -> Parameters {
    let mut params = draft.clone();

    match device_type {
        DeviceType::WaterHeater => {
            or_default(&mut params, "temperature", json!(DEFAULT_WATER_TEMP));
            or_default(&mut params, "target_temperature", json!(DEFAULT_WATER_TEMP));
            or_default(&mut params, "timer_enabled", json!(DEFAULT_TIMER_ENABLED));
            if flag(&params, "timer_enabled") {
                or_default(&mut params, "scheduled_on", json!(DEFAULT_START_TIME));
                or_default(&mut params, "scheduled_off", json!(DEFAULT_STOP_TIME));
            }
        }
        DeviceType::Light => {
            or_default(&mut params, "is_dimmable", json!(DEFAULT_DIMMABLE));
            if flag(&params, "is_dimmable") {
                or_default(&mut params, "brightness", json!(DEFAULT_BRIGHTNESS));
            }
            or_default(&mut params, "dynamic_color", json!(DEFAULT_DYNAMIC_COLOR));
            if flag(&params, "dynamic_color") {
                or_default(&mut params, "color", json!(DEFAULT_LIGHT_COLOR));
            }
        }
        DeviceType::DoorLock => {
            or_default(&mut params, "auto_lock_enabled", json!(DEFAULT_AUTO_LOCK_ENABLED));
            if flag(&params, "auto_lock_enabled") {
                params.insert("battery_level".into(), json!(DEFAULT_BATTERY));
            } else {
                params.remove("battery_level");
            }
        }
        DeviceType::Curtain => {
            params.insert("position".into(), json!(DEFAULT_POSITION));
        }
        DeviceType::AirConditioner => {
            or_default(&mut params, "temperature", json!(DEFAULT_AC_TEMP));
            or_default(&mut params, "mode", json!(DEFAULT_AC_MODE));
            or_default(&mut params, "fan_speed", json!(DEFAULT_AC_FAN));
            or_default(&mut params, "swing", json!(DEFAULT_AC_SWING));
        }
        DeviceType::Unknown(other) => {
            tracing::warn!(device_type = %other, "Unknown device type, sending no parameters");
        }
    }

    let allowed = allowed_keys(device_type);
    params.retain(|key, _| allowed.contains(&key.as_str()));
    params
}

/// Whole numbers go out as integers so the backend sees `60`, not `60.0`.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Parse a raw form value for `key` according to its field kind.
///
/// `allowed` decides which access levels are accepted, so the device panel
/// can refuse read-only fields while the new-device form accepts
/// create-only toggles.
pub fn parse_field(
    device_type: &DeviceType,
    key: &str,
    raw: &str,
    allowed: &[Access],
) -> Result<Value, InputError> {
    let spec =
        field_spec(device_type, key).ok_or_else(|| InputError::UnknownField(key.to_string()))?;
    if !allowed.contains(&spec.access) {
        return Err(InputError::NotEditable(spec.label.to_string()));
    }

    match spec.kind {
        FieldKind::Number { min, max } => {
            NumberRule::between(min, max).validate(raw).map(number_value)
        }
        FieldKind::Reading => NumberRule::default().validate(raw).map(number_value),
        FieldKind::Bool => Ok(Value::Bool(parse_checkbox(raw))),
        FieldKind::Time => TimeRule.validate(raw).map(Value::String),
        FieldKind::Color => ColorRule.validate(raw).map(Value::String),
        FieldKind::Select(options) => {
            find_option(options, raw).map(|o| Value::String(o.value.to_string()))
        }
    }
}

/// Validate a device-panel edit. Only action fields can be changed.
pub fn validate_action(device_type: &DeviceType, key: &str, raw: &str) -> Result<Value, InputError> {
    parse_field(device_type, key, raw, &[Access::Action])
}

/// HTML checkboxes post `on`; the JSON API uses `true`.
pub fn parse_checkbox(raw: &str) -> bool {
    matches!(raw.trim(), "on" | "true" | "1" | "yes")
}

/// Flag parameter a field is only meaningful with, if any.
pub fn requires(key: &str) -> Option<&'static str> {
    match key {
        "brightness" => Some("is_dimmable"),
        "color" => Some("dynamic_color"),
        _ => None,
    }
}

/// Fields the device panel shows for this device.
pub fn visible_fields(device: &Device) -> Vec<&'static FieldSpec> {
    fields(&device.device_type)
        .iter()
        .filter(|f| requires(f.key).is_none_or(|flag| device.param_bool(flag)))
        .collect()
}

/// Default shown as a placeholder in the new-device form.
pub fn default_text(device_type: &DeviceType, key: &str) -> Option<String> {
    let text = match (device_type, key) {
        (DeviceType::WaterHeater, "target_temperature") => DEFAULT_WATER_TEMP.to_string(),
        (DeviceType::WaterHeater, "scheduled_on") => DEFAULT_START_TIME.to_string(),
        (DeviceType::WaterHeater, "scheduled_off") => DEFAULT_STOP_TIME.to_string(),
        (DeviceType::Light, "brightness") => DEFAULT_BRIGHTNESS.to_string(),
        (DeviceType::Light, "color") => DEFAULT_LIGHT_COLOR.to_string(),
        (DeviceType::AirConditioner, "temperature") => DEFAULT_AC_TEMP.to_string(),
        (DeviceType::AirConditioner, "mode") => DEFAULT_AC_MODE.to_string(),
        (DeviceType::AirConditioner, "fan_speed") => DEFAULT_AC_FAN.to_string(),
        (DeviceType::AirConditioner, "swing") => DEFAULT_AC_SWING.to_string(),
        _ => return None,
    };
    Some(text)
}
