//! Shared UI components for the Dioxus-based web UI.

pub mod device_card;
pub mod error_alert;
pub mod inputs;
pub mod layout;
pub mod new_device_form;

pub use device_card::DeviceCard;
pub use error_alert::ErrorAlert;
pub use layout::Layout;
pub use new_device_form::NewDeviceFormView;
