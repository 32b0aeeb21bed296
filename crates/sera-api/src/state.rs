//! Application state wiring the relay together.
//!
//! AppState holds the shared assistant and the callback client used by both
//! boundary adapters. The assistant is generic over its store; AppState pins
//! it to the in-memory implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use sera_core::assistant::Assistant;
use sera_core::assistant::prompt::SystemPrompt;
use sera_core::assistant::retry::RetryPolicy;
use sera_core::llm::box_provider::BoxLlmProvider;
use sera_infra::callback::CallbackClient;
use sera_infra::config::resolve_persona;
use sera_infra::llm::create_provider;
use sera_infra::store::InMemoryConversationStore;
use sera_types::config::{RelayConfig, SessionCookieConfig};

/// Assistant pinned to the in-process store.
pub type ConcreteAssistant = Assistant<InMemoryConversationStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<ConcreteAssistant>,
    pub store: InMemoryConversationStore,
    pub callbacks: CallbackClient,
    pub session: Arc<SessionCookieConfig>,
    /// Landing page file; a built-in page is served when it does not exist.
    pub index_path: Arc<PathBuf>,
}

impl AppState {
    /// Build the production state: Gemini provider, resolved persona, in-memory store.
    pub async fn init(config: &RelayConfig, api_key: Option<SecretString>) -> anyhow::Result<Self> {
        let provider = create_provider(&config.upstream, api_key)?;
        Self::with_provider(config, provider).await
    }

    /// Build state around an already-constructed provider.
    pub async fn with_provider(config: &RelayConfig, provider: BoxLlmProvider) -> anyhow::Result<Self> {
        let persona = resolve_persona(&config.persona).await?;
        let prompt = SystemPrompt::new(persona, &config.persona)?;
        let store = InMemoryConversationStore::from_config(&config.store);

        let assistant = Assistant::new(
            provider,
            store.clone(),
            prompt,
            config.upstream.generation.clone(),
            RetryPolicy::from(&config.retry),
        );

        let callbacks = CallbackClient::new(Duration::from_secs(config.upstream.timeout_secs))?;

        Ok(Self {
            assistant: Arc::new(assistant),
            store,
            callbacks,
            session: Arc::new(config.session.clone()),
            index_path: Arc::new(config.web.index_path.clone()),
        })
    }
}
