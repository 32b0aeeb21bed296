//! The assistant: one user message in, one rendered reply out.
//!
//! `Assistant` loads the user's history, builds the upstream request
//! (system instruction + history + new user turn), drives the retry state
//! machine, and on success appends the user/model pair to the store and
//! returns the model text rendered as HTML. Every failure is converted into
//! a user-facing string; nothing propagates to the transport layer.

use tracing::{debug, info, warn};

use sera_types::conversation::{Turn, UserId};
use sera_types::llm::{GenerateRequest, GenerationConfig};

use crate::assistant::prompt::SystemPrompt;
use crate::assistant::render::render_markdown;
use crate::assistant::retry::{AttemptOutcome, RetryPolicy, RetryState};
use crate::conversation::store::ConversationStore;
use crate::llm::box_provider::BoxLlmProvider;

/// Reply returned when every attempt failed transiently.
pub const EXHAUSTED_MESSAGE: &str =
    "Sorry, I tried several times but still could not get an answer. Please try again later.";

/// Reply returned for a non-retryable upstream failure.
pub fn fatal_message(detail: &str) -> String {
    format!("Sorry, something went wrong: {detail}")
}

/// Outcome of one exchange, already in user-facing form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The model's answer rendered as HTML.
    Rendered(String),
    /// An apology or error string; history was not modified.
    Failed(String),
}

impl Reply {
    /// The string shown to the user, whichever way the exchange went.
    pub fn text(&self) -> &str {
        match self {
            Reply::Rendered(text) | Reply::Failed(text) => text,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Rendered(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Rendered(text) | Reply::Failed(text) => text,
        }
    }
}

/// Produces rendered replies for `(user, message)` pairs.
///
/// Generic over the store so the in-process map can be swapped for another
/// backing without touching this type.
pub struct Assistant<S: ConversationStore> {
    provider: BoxLlmProvider,
    store: S,
    prompt: SystemPrompt,
    generation: GenerationConfig,
    policy: RetryPolicy,
}

impl<S: ConversationStore> Assistant<S> {
    pub fn new(
        provider: BoxLlmProvider,
        store: S,
        prompt: SystemPrompt,
        generation: GenerationConfig,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            store,
            prompt,
            generation,
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn provider(&self) -> &BoxLlmProvider {
        &self.provider
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one exchange with the configured retry policy.
    pub async fn converse(&self, user: &UserId, message: &str) -> Reply {
        self.converse_with(user, message, &self.policy).await
    }

    /// Run one exchange with an explicit retry policy.
    ///
    /// The message is forwarded as-is, empty or not. History is touched
    /// only on success, with exactly one user/model pair.
    #[tracing::instrument(
        name = "chat",
        skip_all,
        fields(
            user = %user,
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %self.provider.name(),
            gen_ai.request.model = %self.provider.model(),
        )
    )]
    pub async fn converse_with(&self, user: &UserId, message: &str, policy: &RetryPolicy) -> Reply {
        let history = self.store.get(user).await;
        debug!(turns = history.len(), "loaded conversation history");

        let user_turn = Turn::user(message);
        let mut contents = history.into_turns();
        contents.push(user_turn.clone());

        let request = GenerateRequest {
            system_instruction: self.prompt.render(),
            contents,
            generation_config: self.generation.clone(),
        };
        debug!(
            payload = %serde_json::to_string(&request).unwrap_or_default(),
            "upstream payload"
        );

        let mut state = RetryState::start(policy);
        loop {
            state = match state {
                RetryState::Attempting { attempt } => {
                    let result = self.provider.generate(&request).await;
                    if let Ok(response) = &result {
                        debug!(
                            candidates = response.candidates.len(),
                            raw = %serde_json::to_string(response).unwrap_or_default(),
                            "upstream response"
                        );
                    }

                    let outcome = AttemptOutcome::classify(result);
                    match &outcome {
                        AttemptOutcome::TransientFailure(reason) => {
                            warn!(attempt = attempt + 1, error = %reason, "upstream attempt failed (transient)");
                        }
                        AttemptOutcome::FatalFailure(reason) => {
                            warn!(attempt = attempt + 1, error = %reason, "upstream attempt failed (fatal)");
                        }
                        AttemptOutcome::Success(_) => {}
                    }
                    policy.next(attempt, outcome)
                }
                RetryState::Backoff { next_attempt, delay } => {
                    info!(
                        delay_ms = delay.as_millis() as u64,
                        next_attempt = next_attempt + 1,
                        "waiting before retrying upstream"
                    );
                    tokio::time::sleep(delay).await;
                    RetryState::Attempting {
                        attempt: next_attempt,
                    }
                }
                RetryState::Succeeded(model_turn) => {
                    let text = model_turn.text();
                    let stored = self.store.append_exchange(user, user_turn, model_turn).await;
                    info!(turns = stored.len(), "exchange completed");
                    return Reply::Rendered(render_markdown(&text));
                }
                RetryState::ExhaustedFailed => {
                    warn!(attempts = policy.max_attempts, "upstream retries exhausted");
                    return Reply::Failed(EXHAUSTED_MESSAGE.to_string());
                }
                RetryState::FatalFailed { message } => {
                    return Reply::Failed(fatal_message(&message));
                }
            };
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
