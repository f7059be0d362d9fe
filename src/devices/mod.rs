//! Device model shared by the API client, the forms and the page renderer.

pub mod schema;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Type-specific device fields, keyed by parameter name.
pub type Parameters = Map<String, Value>;

/// Kind of device. Decides the parameter schema and the status vocabulary.
///
/// Types the dashboard does not know are kept as `Unknown` so a newer
/// backend does not break the device list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    WaterHeater,
    Light,
    AirConditioner,
    DoorLock,
    Curtain,
    Unknown(String),
}

impl DeviceType {
    /// Every known type, in the order the new-device form lists them.
    pub const KNOWN: [DeviceType; 5] = [
        DeviceType::WaterHeater,
        DeviceType::Light,
        DeviceType::AirConditioner,
        DeviceType::DoorLock,
        DeviceType::Curtain,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            DeviceType::WaterHeater => "water_heater",
            DeviceType::Light => "light",
            DeviceType::AirConditioner => "air_conditioner",
            DeviceType::DoorLock => "door_lock",
            DeviceType::Curtain => "curtain",
            DeviceType::Unknown(other) => other,
        }
    }

    /// Human-readable name for the type picker.
    pub fn label(&self) -> &str {
        match self {
            DeviceType::WaterHeater => "Water heater",
            DeviceType::Light => "Light",
            DeviceType::AirConditioner => "Air conditioner",
            DeviceType::DoorLock => "Door lock",
            DeviceType::Curtain => "Curtain",
            DeviceType::Unknown(other) => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DeviceType::Unknown(_))
    }

    /// Statuses as `(active, inactive)`; the checkbox is ticked when active.
    pub fn status_pair(&self) -> (&'static str, &'static str) {
        match self {
            DeviceType::Curtain => ("open", "closed"),
            DeviceType::DoorLock => ("locked", "unlocked"),
            _ => ("on", "off"),
        }
    }

    /// Status a freshly created device starts in.
    pub fn default_status(&self) -> &'static str {
        match self {
            DeviceType::Curtain => "open",
            DeviceType::DoorLock => "unlocked",
            _ => "off",
        }
    }

    /// Caption next to the status checkbox.
    pub fn status_caption(&self) -> &'static str {
        match self {
            DeviceType::Curtain => "Open",
            DeviceType::DoorLock => "Locked",
            _ => "On/Off",
        }
    }
}

impl From<String> for DeviceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "water_heater" => DeviceType::WaterHeater,
            "light" => DeviceType::Light,
            "air_conditioner" => DeviceType::AirConditioner,
            "door_lock" => DeviceType::DoorLock,
            "curtain" => DeviceType::Curtain,
            _ => DeviceType::Unknown(value),
        }
    }
}

impl From<&str> for DeviceType {
    fn from(value: &str) -> Self {
        DeviceType::from(value.to_string())
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device as returned by `GET /api/devices/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Device {
    /// Whether the status checkbox is ticked.
    pub fn is_active(&self) -> bool {
        self.status == self.device_type.status_pair().0
    }

    /// Status the checkbox switches to when clicked.
    pub fn next_status(&self) -> &'static str {
        let (active, inactive) = self.device_type.status_pair();
        match self.device_type {
            // Anything other than an explicit "unlocked" is treated as locked.
            DeviceType::DoorLock => {
                if self.status == inactive {
                    active
                } else {
                    inactive
                }
            }
            _ => {
                if self.status == active {
                    inactive
                } else {
                    active
                }
            }
        }
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    pub fn param_bool(&self, key: &str) -> bool {
        self.param(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Parameter as display text (`""` when absent).
    pub fn param_text(&self, key: &str) -> String {
        match self.param(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Partial metadata update, sent as `PUT /api/devices/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceUpdate {
    pub id: String,
    pub changes: Parameters,
}

impl DeviceUpdate {
    pub fn field(id: &str, field: &str, value: impl Into<Value>) -> Self {
        let mut changes = Parameters::new();
        changes.insert(field.to_string(), value.into());
        Self {
            id: id.to_string(),
            changes,
        }
    }
}

/// Device-specific command, sent as `POST /api/devices/{id}/action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAction {
    pub id: String,
    pub changes: Parameters,
}

impl DeviceAction {
    pub fn parameter(id: &str, key: &str, value: Value) -> Self {
        let mut changes = Parameters::new();
        changes.insert(key.to_string(), value);
        Self {
            id: id.to_string(),
            changes,
        }
    }
}
