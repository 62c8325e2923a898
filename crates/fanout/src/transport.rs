//! Transport seam for talking to photo servers.
//!
//! [`UpdateTransport`] abstracts the single HTTP call the fan-out layer
//! makes, so the retry and replication logic can be exercised against fakes.
//! [`HttpTransport`] is the production reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use lightbox_db::models::photo_server::PhotoServer;

use crate::commands::SetCommand;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a failed delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The photo server returned a non-2xx status code.
    #[error("photo server returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// UpdateTransport
// ---------------------------------------------------------------------------

/// Sends one batch of commands to one photo server.
///
/// Implementations must treat any non-success response as an error; the
/// retry layer decides whether to try again.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn send_commands(
        &self,
        server: &PhotoServer,
        commands: &[SetCommand],
    ) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Production transport: POSTs the JSON command list to the server's
/// `photos_update_url` with its registered auth key.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a pre-configured HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }
}

#[async_trait]
impl UpdateTransport for HttpTransport {
    async fn send_commands(
        &self,
        server: &PhotoServer,
        commands: &[SetCommand],
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&server.photos_update_url)
            .header("Authorization", format!("Key {}", server.auth_key))
            .json(commands)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
