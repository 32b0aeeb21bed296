//! Gemini REST API types.
//!
//! Request-side wrappers around the provider-agnostic types from
//! `sera-types`. Turns already serialize in Gemini's `contents` shape, so
//! only the system instruction needs wrapping.

use serde::{Deserialize, Serialize};

use sera_types::conversation::{Part, Turn};
use sera_types::llm::{GenerateRequest, GenerationConfig};

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest<'a> {
    pub system_instruction: SystemInstruction,
    pub contents: &'a [Turn],
    pub generation_config: &'a GenerationConfig,
}

/// `systemInstruction` carries parts but no role.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

impl<'a> From<&'a GenerateRequest> for GeminiRequest<'a> {
    fn from(request: &'a GenerateRequest) -> Self {
        Self {
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: request.system_instruction.clone(),
                }],
            },
            contents: &request.contents,
            generation_config: &request.generation_config,
        }
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorEnvelope {
    pub error: GeminiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl GeminiErrorEnvelope {
    /// Best-effort human text for an error body; falls back to the raw body.
    pub fn describe(body: &str) -> String {
        match serde_json::from_str::<GeminiErrorEnvelope>(body) {
            Ok(envelope) if !envelope.error.status.is_empty() => {
                format!("{} ({})", envelope.error.message, envelope.error.status)
            }
            Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
            _ => body.to_string(),
        }
    }

    /// Whether the body reports that the model itself is overloaded.
    pub fn is_overloaded(body: &str) -> bool {
        serde_json::from_str::<GeminiErrorEnvelope>(body)
            .is_ok_and(|envelope| envelope.error.message.to_lowercase().contains("overloaded"))
    }
}
