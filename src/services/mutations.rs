use tracing::{info, warn};

use super::DeviceService;
use crate::bus::BusEvent;
use crate::client::ApiError;
use crate::devices::{Device, DeviceAction, DeviceUpdate};
use crate::query::QueryFilter;

impl DeviceService {
    /// Create a device. A new id changes the id list and may change how
    /// every device is grouped, so everything is invalidated.
    pub async fn create_device(&self, device: &Device) -> Result<(), ApiError> {
        let result = {
            let _mutation = self.cache.begin_mutation();
            self.backend.create_device(device).await
        };

        match &result {
            Ok(()) => {
                info!(id = %device.id, device_type = %device.device_type, "Device created");
                self.cache.invalidate(QueryFilter::DeviceIds).await;
                self.cache.invalidate(QueryFilter::AllDevices).await;
                self.bus.publish(BusEvent::DeviceCreated {
                    id: device.id.clone(),
                });
            }
            Err(e) => warn!(id = %device.id, "Create device failed: {}", e),
        }
        result
    }

    /// Change name, room or status.
    pub async fn update_device(&self, update: &DeviceUpdate) -> Result<(), ApiError> {
        let result = {
            let _mutation = self.cache.begin_mutation();
            self.backend.update_device(update).await
        };

        match &result {
            Ok(()) => {
                info!(id = %update.id, "Device updated");
                self.cache.invalidate(QueryFilter::DeviceIds).await;
                self.cache
                    .invalidate(QueryFilter::Device(update.id.clone()))
                    .await;
                self.bus.publish(BusEvent::DeviceUpdated {
                    id: update.id.clone(),
                });
            }
            Err(e) => warn!(id = %update.id, "Update device failed: {}", e),
        }
        result
    }

    /// Remove a device. Its cached entry is dropped whether or not the
    /// backend call succeeded.
    pub async fn delete_device(&self, id: &str) -> Result<(), ApiError> {
        let result = {
            let _mutation = self.cache.begin_mutation();
            self.backend.delete_device(id).await
        };

        match &result {
            Ok(()) => {
                info!(id, "Device removed");
                self.cache.invalidate(QueryFilter::DeviceIds).await;
                self.bus.publish(BusEvent::DeviceRemoved { id: id.to_string() });
            }
            Err(e) if e.is_not_found() => {
                warn!(id, "Device already gone from backend: {}", e);
                self.cache.invalidate(QueryFilter::DeviceIds).await;
            }
            Err(e) => warn!(id, "Delete device failed: {}", e),
        }
        self.cache.remove(QueryFilter::Device(id.to_string())).await;
        result
    }

    /// Send a parameter change to the device.
    pub async fn device_action(&self, action: &DeviceAction) -> Result<(), ApiError> {
        let result = {
            let _mutation = self.cache.begin_mutation();
            self.backend.device_action(action).await
        };

        match &result {
            Ok(()) => {
                info!(id = %action.id, changes = ?action.changes, "Device action applied");
                self.cache
                    .invalidate(QueryFilter::Device(action.id.clone()))
                    .await;
                self.bus.publish(BusEvent::DeviceActionApplied {
                    id: action.id.clone(),
                });
            }
            Err(e) => warn!(id = %action.id, "Device action failed: {}", e),
        }
        result
    }
}
