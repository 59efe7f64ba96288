//! Notification transports.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Default request timeout for webhook calls.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single delivery attempt.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The request could not be sent or timed out.
    #[error("Request failed: {0}")]
    Request(String),

    /// The hook answered with a non-success status.
    #[error("Hook responded with status {0}")]
    Status(u16),

    /// The HTTP client could not be built.
    #[error("Client setup failed: {0}")]
    Client(String),
}

/// Sends one payload to one URL.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Deliver `payload` to `url`.
    async fn deliver(&self, url: &str, payload: &serde_json::Value) -> Result<(), DeliveryError>;
}

/// JSON-over-HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationTransport for HttpTransport {
    async fn deliver(&self, url: &str, payload: &serde_json::Value) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        Ok(())
    }
}
