//! Synchronous chat handler.
//!
//! The caller waits for the whole exchange, retries included, and gets the
//! rendered reply (or the apology text) in the response body.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::http::extractors::identity::CallerIdentity;
use crate::state::AppState;

/// Request body for `POST /chat`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub chat: Option<String>,
}

/// Response body for `POST /chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /chat - Run one exchange and return the reply.
///
/// A missing `chat` field is forwarded upstream as the empty string. So is
/// a body that is absent or not JSON at all.
pub async fn chat(
    State(state): State<AppState>,
    identity: CallerIdentity,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable chat body, treating as empty");
            ChatRequest::default()
        }
    };
    let message = request.chat.unwrap_or_default();
    tracing::info!(user = %identity.user, chars = message.chars().count(), "chat message received");

    let reply = state.assistant.converse(&identity.user, &message).await;
    if !reply.is_success() {
        tracing::warn!(user = %identity.user, "exchange failed, returning apology");
    }

    identity.attach(
        &state.session,
        Json(ChatResponse {
            response: reply.into_text(),
        }),
    )
}
