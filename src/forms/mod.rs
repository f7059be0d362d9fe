//! Form state for creating devices and editing an existing one.

mod device_panel;
mod new_device;

pub use device_panel::{
    confirm_removal_prompt, edit_field, move_to_room, rename, set_parameter, toggle_status,
    EditTarget, PanelChange,
};
pub use new_device::{NewDeviceForm, PARAM_PREFIX};

use thiserror::Error;

use crate::inputs::InputError;

/// Why a new-device submission was refused. Checked in declaration order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Must enter an ID")]
    MissingId,
    #[error("ID must be unique, this ID is already taken")]
    DuplicateId,
    #[error("Must enter a name")]
    MissingName,
    #[error("Must enter a room name")]
    MissingRoom,
    #[error("Must choose a type")]
    MissingType,
    #[error(transparent)]
    Parameter(#[from] InputError),
}
