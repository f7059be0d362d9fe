//! Mock servers for integration testing
//!
//! Simulates the device REST backend so the client and the whole
//! dashboard can be tested without a real one.

pub mod devices;

pub use devices::MockDeviceBackend;
