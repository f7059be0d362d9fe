//! Page components for the Dioxus-based web UI.

pub mod dashboard;

pub use dashboard::{DashboardPage, DashboardView};
