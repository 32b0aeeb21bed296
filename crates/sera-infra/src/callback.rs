//! Outbound result delivery for the callback variant.
//!
//! After an exchange finishes on a background task, its result is POSTed
//! once to the caller-supplied address. Delivery is best-effort: the caller
//! logs a [`CallbackError`] and moves on, nothing is retried.

use std::time::Duration;

use serde::Serialize;

use sera_core::assistant::Reply;

/// Body POSTed to the callback address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CallbackPayload {
    /// `{"response": "<rendered html>"}`
    Response { response: String },
    /// `{"error": "<user-facing failure text>"}`
    Error { error: String },
}

impl From<Reply> for CallbackPayload {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Rendered(response) => CallbackPayload::Response { response },
            Reply::Failed(error) => CallbackPayload::Error { error },
        }
    }
}

/// Errors delivering a callback.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("callback request failed: {0}")]
    Transport(String),

    #[error("callback endpoint returned HTTP {status}")]
    Rejected { status: u16 },
}

/// Thin reqwest wrapper for callback POSTs.
#[derive(Clone)]
pub struct CallbackClient {
    client: reqwest::Client,
}

impl CallbackClient {
    pub fn new(timeout: Duration) -> Result<Self, CallbackError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CallbackError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// POST `payload` to `url` once.
    pub async fn deliver(&self, url: &str, payload: &CallbackPayload) -> Result<(), CallbackError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CallbackError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::Rejected {
                status: status.as_u16(),
            });
        }
        tracing::debug!(%status, "callback delivered");
        Ok(())
    }
}
