use serde_json::Value;

use crate::devices::schema;
use crate::devices::{Device, DeviceAction, DeviceUpdate};
use crate::inputs::{InputError, TextRule, Validator};

/// The request a device panel edit turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelChange {
    Update(DeviceUpdate),
    Action(DeviceAction),
}

/// Which field of which device is in editing mode, carried in the page's
/// `edit` query parameter as `{device_id}:{field}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub device_id: String,
    pub field: String,
}

impl EditTarget {
    pub fn new(device_id: &str, field: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            field: field.to_string(),
        }
    }

    /// Field names never contain `:`, device ids might.
    pub fn parse(raw: &str) -> Option<Self> {
        let (device_id, field) = raw.rsplit_once(':')?;
        if device_id.is_empty() || field.is_empty() {
            return None;
        }
        Some(Self::new(device_id, field))
    }

    pub fn is(&self, device_id: &str, field: &str) -> bool {
        self.device_id == device_id && self.field == field
    }

    pub fn to_query(&self) -> String {
        format!("{}:{}", self.device_id, self.field)
    }
}

pub fn toggle_status(device: &Device) -> DeviceUpdate {
    DeviceUpdate::field(&device.id, "status", device.next_status())
}

pub fn rename(device: &Device, name: &str) -> DeviceUpdate {
    DeviceUpdate::field(&device.id, "name", name.trim())
}

pub fn move_to_room(device: &Device, room: &str) -> DeviceUpdate {
    DeviceUpdate::field(&device.id, "room", room.trim())
}

/// Validate a parameter edit and build the action for it.
pub fn set_parameter(device: &Device, key: &str, raw: &str) -> Result<DeviceAction, InputError> {
    let value: Value = schema::validate_action(&device.device_type, key, raw)?;
    Ok(DeviceAction::parameter(&device.id, key, value))
}

/// Turn a saved edit-in-place value into the request to send. `name` and
/// `room` are metadata updates; everything else is a parameter action.
pub fn edit_field(device: &Device, field: &str, raw: &str) -> Result<PanelChange, InputError> {
    match field {
        "name" => {
            let name = TextRule.validate(raw)?;
            Ok(PanelChange::Update(rename(device, &name)))
        }
        "room" => {
            let room = TextRule.validate(raw)?;
            Ok(PanelChange::Update(move_to_room(device, &room)))
        }
        key => set_parameter(device, key, raw).map(PanelChange::Action),
    }
}

pub fn confirm_removal_prompt(device: &Device) -> String {
    format!("Are you sure you want to remove {}?", device.name)
}
