//! Request/response calls to the server: publish and leave.

use chitty_chat_shared::wire::{ChatMessage, LeaveRequest};

use super::error::ClientError;

/// HTTP client for the publish/leave endpoints.
pub struct ChatApi {
    http: reqwest::Client,
    base_url: String,
}

impl ChatApi {
    /// # Arguments
    ///
    /// * `base_url` - e.g. "http://127.0.0.1:8080", no trailing slash
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Publish a message for broadcast.
    pub async fn publish(&self, message: &ChatMessage) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/api/publish", self.base_url))
            .json(message)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        match response.status().as_u16() {
            200 => Ok(()),
            422 => Err(ClientError::Rejected(
                "message rejected as invalid".to_string(),
            )),
            status => Err(ClientError::Connection(format!(
                "publish failed with status {}",
                status
            ))),
        }
    }

    /// Announce departure and deactivate this user on the server.
    pub async fn leave(&self, request: &LeaveRequest) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/api/leave", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Connection(format!(
                "leave failed with status {}",
                response.status().as_u16()
            )))
        }
    }
}
