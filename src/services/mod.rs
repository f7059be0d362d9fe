//! Device queries and mutations.
//!
//! `DeviceService` is the one place the rest of the crate talks to the
//! device backend through. Reads go through the [`QueryCache`]; writes
//! invalidate the cache entries they affect and announce themselves on the
//! event bus so open pages reload.

mod mutations;
mod queries;

pub use queries::DevicesResult;

use std::sync::Arc;

use crate::bus::SharedBus;
use crate::client::DeviceBackend;
use crate::query::QueryCache;

#[derive(Clone)]
pub struct DeviceService {
    backend: Arc<dyn DeviceBackend>,
    cache: Arc<QueryCache>,
    bus: SharedBus,
}

impl DeviceService {
    pub fn new(backend: Arc<dyn DeviceBackend>, bus: SharedBus) -> Self {
        Self {
            backend,
            cache: Arc::new(QueryCache::new()),
            bus,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }

    /// Whether inputs should be disabled because requests are in flight.
    pub fn is_busy(&self) -> bool {
        !self.cache.activity().is_idle()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend for service and handler tests.

    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::client::{ApiError, DeviceBackend};
    use crate::devices::{Device, DeviceAction, DeviceUpdate};

    #[derive(Default)]
    pub struct MemoryBackend {
        pub devices: Mutex<BTreeMap<String, Device>>,
        pub calls: Mutex<Vec<String>>,
        pub fail_with: Mutex<Option<ApiError>>,
    }

    impl MemoryBackend {
        pub fn with_devices(devices: Vec<Device>) -> Self {
            let backend = Self::default();
            {
                let mut map = backend.devices.lock().unwrap();
                for d in devices {
                    map.insert(d.id.clone(), d);
                }
            }
            backend
        }

        pub fn fail(&self, error: ApiError) {
            *self.fail_with.lock().unwrap() = Some(error);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with.lock().unwrap().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn not_found(id: &str) -> ApiError {
            ApiError::Server {
                status: 404,
                message: format!("Device {id} not found"),
            }
        }
    }

    #[async_trait]
    impl DeviceBackend for MemoryBackend {
        async fn get_device_ids(&self) -> Result<Vec<String>, ApiError> {
            self.record("GET ids".into())?;
            Ok(self.devices.lock().unwrap().keys().cloned().collect())
        }

        async fn get_device(&self, id: &str) -> Result<Device, ApiError> {
            self.record(format!("GET {id}"))?;
            self.devices
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| Self::not_found(id))
        }

        async fn create_device(&self, device: &Device) -> Result<(), ApiError> {
            self.record(format!("POST {}", device.id))?;
            self.devices
                .lock()
                .unwrap()
                .insert(device.id.clone(), device.clone());
            Ok(())
        }

        async fn update_device(&self, update: &DeviceUpdate) -> Result<(), ApiError> {
            self.record(format!("PUT {}", update.id))?;
            let mut devices = self.devices.lock().unwrap();
            let device = devices
                .get_mut(&update.id)
                .ok_or_else(|| Self::not_found(&update.id))?;
            for (field, value) in &update.changes {
                let text = value.as_str().unwrap_or_default().to_string();
                match field.as_str() {
                    "name" => device.name = text,
                    "room" => device.room = text,
                    "status" => device.status = text,
                    _ => {}
                }
            }
            Ok(())
        }

        async fn device_action(&self, action: &DeviceAction) -> Result<(), ApiError> {
            self.record(format!("ACTION {}", action.id))?;
            let mut devices = self.devices.lock().unwrap();
            let device = devices
                .get_mut(&action.id)
                .ok_or_else(|| Self::not_found(&action.id))?;
            for (key, value) in &action.changes {
                device.parameters.insert(key.clone(), value.clone());
            }
            Ok(())
        }

        async fn delete_device(&self, id: &str) -> Result<(), ApiError> {
            self.record(format!("DELETE {id}"))?;
            self.devices
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(id))
        }
    }

    pub fn device(id: &str, device_type: &str, room: &str) -> Device {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": device_type,
            "name": format!("Device {id}"),
            "room": room,
            "status": "off",
            "parameters": {}
        }))
        .unwrap()
    }
}
