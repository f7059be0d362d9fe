//! Device REST backend client.
//!
//! The backend exposes a flat JSON API:
//!
//! | call               | request                                |
//! |--------------------|----------------------------------------|
//! | list ids           | `GET /api/ids`                         |
//! | fetch device       | `GET /api/devices/{id}`                |
//! | create device      | `POST /api/devices`                    |
//! | update fields      | `PUT /api/devices/{id}`                |
//! | device action      | `POST /api/devices/{id}/action`        |
//! | delete device      | `DELETE /api/devices/{id}`             |
//!
//! Errors come back as `{"error": "..."}`; that message is what the user sees.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::devices::{Device, DeviceAction, DeviceUpdate};

/// Failure talking to the device backend.
///
/// The `Display` text is the message shown in the error alert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend rejected the request and said why.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// Non-2xx without an error body.
    #[error("Request failed with status code {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
    #[error("Invalid response from server: {0}")]
    Decode(String),
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } | ApiError::Status(status) => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Operations the dashboard needs from the device backend.
#[async_trait]
pub trait DeviceBackend: Send + Sync + 'static {
    async fn get_device_ids(&self) -> Result<Vec<String>, ApiError>;

    async fn get_device(&self, id: &str) -> Result<Device, ApiError>;

    async fn create_device(&self, device: &Device) -> Result<(), ApiError>;

    async fn update_device(&self, update: &DeviceUpdate) -> Result<(), ApiError>;

    async fn device_action(&self, action: &DeviceAction) -> Result<(), ApiError>;

    async fn delete_device(&self, id: &str) -> Result<(), ApiError>;
}

/// reqwest-backed [`DeviceBackend`].
#[derive(Clone)]
pub struct HttpDeviceClient {
    client: Client,
    base_url: String,
}

impl HttpDeviceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ids_url(&self) -> String {
        format!("{}/api/ids", self.base_url)
    }

    fn devices_url(&self) -> String {
        format!("{}/api/devices", self.base_url)
    }

    fn device_url(&self, id: &str) -> String {
        format!("{}/api/devices/{}", self.base_url, urlencoding::encode(id))
    }

    fn action_url(&self, id: &str) -> String {
        format!("{}/action", self.device_url(id))
    }
}

/// Turn a non-2xx response into an [`ApiError`], preferring the backend's
/// own message.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error }) => Err(ApiError::Server {
            status: status.as_u16(),
            message: error,
        }),
        Err(_) => Err(ApiError::Status(status.as_u16())),
    }
}

#[async_trait]
impl DeviceBackend for HttpDeviceClient {
    async fn get_device_ids(&self) -> Result<Vec<String>, ApiError> {
        let response = check(self.client.get(self.ids_url()).send().await?).await?;
        let ids: Vec<String> = response.json().await?;
        debug!(count = ids.len(), "Fetched device ids");
        Ok(ids)
    }

    async fn get_device(&self, id: &str) -> Result<Device, ApiError> {
        let response = check(self.client.get(self.device_url(id)).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn create_device(&self, device: &Device) -> Result<(), ApiError> {
        debug!(id = %device.id, device_type = %device.device_type, "Creating device");
        check(self.client.post(self.devices_url()).json(device).send().await?).await?;
        Ok(())
    }

    async fn update_device(&self, update: &DeviceUpdate) -> Result<(), ApiError> {
        debug!(id = %update.id, changes = ?update.changes, "Updating device");
        check(
            self.client
                .put(self.device_url(&update.id))
                .json(&update.changes)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn device_action(&self, action: &DeviceAction) -> Result<(), ApiError> {
        debug!(id = %action.id, changes = ?action.changes, "Sending device action");
        check(
            self.client
                .post(self.action_url(&action.id))
                .json(&action.changes)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn delete_device(&self, id: &str) -> Result<(), ApiError> {
        debug!(id, "Deleting device");
        check(self.client.delete(self.device_url(id)).send().await?).await?;
        Ok(())
    }
}
