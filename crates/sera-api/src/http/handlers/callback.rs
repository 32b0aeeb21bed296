//! Callback-variant chat handler.
//!
//! Acknowledges immediately, runs the exchange on a background task, then
//! POSTs the outcome once to the caller-supplied `callbackUrl`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use sera_infra::callback::CallbackPayload;

use crate::http::error::AppError;
use crate::http::extractors::identity::CallerIdentity;
use crate::state::AppState;

pub const ACCEPTED_MESSAGE: &str =
    "Request accepted. Processing; the result will be delivered to the callback URL.";

pub const MISSING_PARAMS_MESSAGE: &str = "Parameters 'chat' and 'callbackUrl' are required.";

/// Request body for `POST /chat/callback`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackChatRequest {
    #[serde(default)]
    pub chat: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
}

impl CallbackChatRequest {
    /// Both fields, or a validation error when either is missing or blank.
    fn validate(self) -> Result<(String, String), AppError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (present(self.chat), present(self.callback_url)) {
            (Some(chat), Some(url)) => Ok((chat, url)),
            _ => Err(AppError::Validation(MISSING_PARAMS_MESSAGE.to_string())),
        }
    }
}

/// POST /chat/callback - Accept a message and deliver the reply later.
pub async fn chat_callback(
    State(state): State<AppState>,
    identity: CallerIdentity,
    body: Result<Json<CallbackChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body?;
    let (message, callback_url) = request.validate()?;
    tracing::info!(user = %identity.user, %callback_url, "callback chat accepted");

    let assistant = Arc::clone(&state.assistant);
    let callbacks = state.callbacks.clone();
    let user = identity.user.clone();
    tokio::spawn(async move {
        let reply = assistant.converse(&user, &message).await;
        let payload = CallbackPayload::from(reply);
        match callbacks.deliver(&callback_url, &payload).await {
            Ok(()) => {
                tracing::info!(user = %user, %callback_url, "callback delivered");
            }
            Err(e) => {
                tracing::error!(user = %user, %callback_url, error = %e, "callback delivery failed");
            }
        }
    });

    Ok(identity.attach(&state.session, Json(json!({ "message": ACCEPTED_MESSAGE }))))
}
