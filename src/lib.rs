//! Home Device Dashboard
//!
//! A web dashboard for the devices of a smart-home REST backend.
//!
//! This library provides:
//! - A typed client for the device backend
//! - Per-type parameter tables and input validation
//! - A query cache with invalidation after writes
//! - An idle-triggered auto refresh
//! - Server-Sent Events for live page reloads
//! - Web UI for daily control (Pico CSS)

pub mod api;
pub mod bus;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod devices;
pub mod forms;
pub mod inputs;
pub mod query;
pub mod refresh;
pub mod router;
pub mod services;
pub mod ui;
