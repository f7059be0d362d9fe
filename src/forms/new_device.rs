use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use super::FormError;
use crate::devices::schema::{self, Access};
use crate::devices::{Device, DeviceType, Parameters};

/// Form field names carrying a parameter are prefixed with this.
pub const PARAM_PREFIX: &str = "param_";

const CREATE_ACCESS: &[Access] = &[Access::Action, Access::CreateOnly];

/// Draft of the "Add device" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDeviceForm {
    pub id: String,
    pub name: String,
    pub room: String,
    pub device_type: Option<DeviceType>,
    pub status: String,
    pub parameters: Parameters,
    /// Parameter text as typed, for re-rendering a refused form.
    pub raw_parameters: BTreeMap<String, String>,
    /// First parameter that failed validation while the draft was filled.
    pub invalid: Option<FormError>,
}

impl NewDeviceForm {
    /// Build a draft from posted `(name, value)` pairs.
    ///
    /// Unchecked checkboxes are not posted at all; those fields and empty
    /// parameter values are left to the type defaults. A bad parameter value
    /// is kept on the draft and reported by [`submit`](Self::submit).
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields: Vec<(&str, &str)> = fields.into_iter().collect();
        let mut form = NewDeviceForm::default();

        for (key, value) in &fields {
            match *key {
                "id" => form.id = value.trim().to_string(),
                "name" => form.name = value.trim().to_string(),
                "room" => form.room = value.trim().to_string(),
                "type" => form.choose_type(value),
                _ => {}
            }
        }

        // The page posts the fields of every type; keep only the chosen one's.
        let Some(device_type) = form.device_type.clone() else {
            return form;
        };
        for (key, value) in &fields {
            let Some(param) = key.strip_prefix(PARAM_PREFIX) else {
                continue;
            };
            if value.trim().is_empty() || schema::field_spec(&device_type, param).is_none() {
                continue;
            }
            form.raw_parameters
                .insert(param.to_string(), value.trim().to_string());
            if let Err(e) = form.set_parameter(param, value) {
                if form.invalid.is_none() {
                    form.invalid = Some(e);
                }
            }
        }
        form
    }

    /// Select a type by wire name. Blank or unrecognised names clear it.
    pub fn choose_type(&mut self, raw: &str) {
        let device_type = DeviceType::from(raw.trim());
        if device_type.is_known() {
            self.select_type(device_type);
        } else {
            self.device_type = None;
            self.status.clear();
        }
    }

    /// Set the type and the status a new device of that type starts in.
    pub fn select_type(&mut self, device_type: DeviceType) {
        self.status = device_type.default_status().to_string();
        self.device_type = Some(device_type);
    }

    /// Record a draft parameter value. Needs a type to know the field.
    pub fn set_parameter(&mut self, key: &str, raw: &str) -> Result<(), FormError> {
        let Some(device_type) = &self.device_type else {
            return Err(FormError::MissingType);
        };
        let value: Value = schema::parse_field(device_type, key, raw, CREATE_ACCESS)?;
        self.parameters.insert(key.to_string(), value);
        Ok(())
    }

    /// Text to show in a parameter input: what was typed, else nothing.
    pub fn raw_parameter(&self, key: &str) -> &str {
        self.raw_parameters.get(key).map(String::as_str).unwrap_or("")
    }

    /// Check the draft and build the device to create.
    ///
    /// `is_unique` is asked whether the id is free.
    pub fn submit(&self, is_unique: impl Fn(&str) -> bool) -> Result<Device, FormError> {
        if self.id.is_empty() {
            return Err(FormError::MissingId);
        }
        if !is_unique(&self.id) {
            return Err(FormError::DuplicateId);
        }
        if self.name.is_empty() {
            return Err(FormError::MissingName);
        }
        if self.room.is_empty() {
            return Err(FormError::MissingRoom);
        }
        let device_type = self.device_type.clone().ok_or(FormError::MissingType)?;
        if let Some(e) = &self.invalid {
            return Err(e.clone());
        }

        let parameters = schema::clean_parameters(&device_type, &self.parameters);
        debug!(id = %self.id, %device_type, ?parameters, "New device form submitted");

        let status = if self.status.is_empty() {
            device_type.default_status().to_string()
        } else {
            self.status.clone()
        };

        Ok(Device {
            id: self.id.clone(),
            device_type,
            name: self.name.clone(),
            room: self.room.clone(),
            status,
            parameters,
        })
    }
}
