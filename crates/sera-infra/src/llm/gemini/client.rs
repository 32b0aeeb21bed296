//! GeminiProvider -- concrete [`LlmProvider`] for the Gemini REST API.
//!
//! Sends non-streaming requests to
//! `{base_url}/v1beta/models/{model}:generateContent`. The API key travels
//! in the `x-goog-api-key` header and is held as a [`SecretString`], so it
//! never shows up in logs or `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use sera_core::llm::provider::LlmProvider;
use sera_types::llm::{GenerateRequest, GenerateResponse, LlmError};

use super::types::{GeminiErrorEnvelope, GeminiRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini upstream provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a provider for `model` with a per-request `timeout`.
    pub fn new(api_key: SecretString, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Map a non-2xx status and its body to an [`LlmError`].
    fn error_for_status(status: reqwest::StatusCode, body: &str) -> LlmError {
        let detail = GeminiErrorEnvelope::describe(body);
        if GeminiErrorEnvelope::is_overloaded(body) {
            return LlmError::Overloaded(detail);
        }
        match status.as_u16() {
            503 => LlmError::Unavailable(detail),
            429 => LlmError::RateLimited(detail),
            401 | 403 => LlmError::AuthenticationFailed(detail),
            400 | 404 => LlmError::InvalidRequest(detail),
            _ => LlmError::Provider {
                message: format!("HTTP {status}: {body}"),
            },
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let body = GeminiRequest::from(request);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, "gemini returned an error status");
            return Err(Self::error_for_status(status, &error_body));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))
    }
}
