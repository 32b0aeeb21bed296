//! Upstream provider implementations.
//!
//! Contains the Gemini implementation of the [`LlmProvider`] trait defined
//! in `sera-core`, and a factory ([`create_provider`]) that builds it from
//! configuration.
//!
//! [`LlmProvider`]: sera_core::llm::provider::LlmProvider

pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use sera_core::llm::box_provider::BoxLlmProvider;
use sera_types::config::UpstreamConfig;
use sera_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create a [`BoxLlmProvider`] from upstream configuration.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is available.
pub fn create_provider(
    config: &UpstreamConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or_else(|| {
        LlmError::AuthenticationFailed("no API key configured (set GEMINI_API_KEY)".to_string())
    })?;
    let provider = GeminiProvider::new(
        key,
        config.model.clone(),
        Duration::from_secs(config.timeout_secs),
    )?
    .with_base_url(config.base_url.clone());
    Ok(BoxLlmProvider::new(provider))
}
