use futures::future::join_all;
use tracing::{debug, warn};

use super::DeviceService;
use crate::bus::BusEvent;
use crate::client::ApiError;
use crate::devices::Device;
use crate::query::{QueryData, QueryFilter, QueryKey};

/// Combined outcome of fetching several devices at once, in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicesResult {
    pub data: Vec<Option<Device>>,
    pub errors: Vec<Option<ApiError>>,
}

impl DevicesResult {
    pub fn is_error(&self) -> bool {
        self.errors.iter().any(Option::is_some)
    }

    pub fn first_error(&self) -> Option<&ApiError> {
        self.errors.iter().flatten().next()
    }

    /// Devices that were fetched successfully.
    pub fn loaded(&self) -> Vec<Device> {
        self.data.iter().flatten().cloned().collect()
    }
}

impl DeviceService {
    /// All device ids known to the backend.
    pub async fn device_ids(&self) -> Result<Vec<String>, ApiError> {
        let backend = self.backend.clone();
        let data = self
            .cache
            .fetch(QueryKey::DeviceIds, || async move {
                backend.get_device_ids().await.map(QueryData::Ids)
            })
            .await?;
        match data {
            QueryData::Ids(ids) => Ok(ids),
            QueryData::Device(_) => Err(ApiError::Decode("expected a list of ids".into())),
        }
    }

    pub async fn device(&self, id: &str) -> Result<Device, ApiError> {
        let backend = self.backend.clone();
        let owned = id.to_string();
        let data = self
            .cache
            .fetch(QueryKey::Device(id.to_string()), || async move {
                backend
                    .get_device(&owned)
                    .await
                    .map(|d| QueryData::Device(Box::new(d)))
            })
            .await?;
        match data {
            QueryData::Device(device) => Ok(*device),
            QueryData::Ids(_) => Err(ApiError::Decode("expected a device".into())),
        }
    }

    /// Fetch every listed device concurrently.
    pub async fn devices(&self, ids: &[String]) -> DevicesResult {
        let results = join_all(ids.iter().map(|id| self.device(id))).await;

        let mut combined = DevicesResult::default();
        for result in results {
            match result {
                Ok(device) => {
                    combined.data.push(Some(device));
                    combined.errors.push(None);
                }
                Err(e) => {
                    combined.data.push(None);
                    combined.errors.push(Some(e));
                }
            }
        }
        combined
    }

    /// Ids plus every device. Fails with the first error, as the dashboard
    /// shows an error page instead of a partial list.
    pub async fn load_devices(&self) -> Result<Vec<Device>, ApiError> {
        let ids = self.device_ids().await?;
        let result = self.devices(&ids).await;
        if let Some(e) = result.first_error() {
            return Err(e.clone());
        }
        Ok(result.loaded())
    }

    /// Invalidate everything and fetch it again.
    pub async fn refresh(&self) -> Result<usize, ApiError> {
        self.cache.invalidate(QueryFilter::DeviceIds).await;
        self.cache.invalidate(QueryFilter::AllDevices).await;

        match self.load_devices().await {
            Ok(devices) => {
                debug!(count = devices.len(), "Device data refreshed");
                self.bus.publish(BusEvent::DevicesRefreshed {
                    device_count: devices.len(),
                });
                Ok(devices.len())
            }
            Err(e) => {
                warn!("Device refresh failed: {}", e);
                self.bus.publish(BusEvent::BackendError {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
