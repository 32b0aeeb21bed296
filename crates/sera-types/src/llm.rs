//! Upstream model request/response types for the Sera relay.
//!
//! These model the `generateContent` exchange: system instruction, replayed
//! history, sampling configuration, and the candidate list that comes back.
//! Field names serialize in camelCase to match the upstream wire format.

use serde::{Deserialize, Deserializer, Serialize};

use crate::conversation::{Part, Role, Turn};

/// Sampling configuration sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_response_mime_type")]
    pub response_mime_type: String,
}

fn default_temperature() -> f64 {
    0.0
}

fn default_top_p() -> f64 {
    0.95
}

fn default_top_k() -> u32 {
    64
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_response_mime_type() -> String {
    "text/plain".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            response_mime_type: default_response_mime_type(),
        }
    }
}

/// Provider-agnostic request for one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub system_instruction: String,
    /// Prior history followed by the new user turn.
    pub contents: Vec<Turn>,
    pub generation_config: GenerationConfig,
}

/// One candidate answer returned by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Absent when the model produced nothing (e.g. blocked output).
    ///
    /// An empty `content` object, or one without parts, also reads as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_content",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Candidate content as it arrives; upstream omits `role` and `parts` when
/// generation stopped before producing text.
#[derive(Deserialize)]
struct RawContent {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    parts: Vec<Part>,
}

fn lenient_content<'de, D>(deserializer: D) -> Result<Option<Turn>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawContent>::deserialize(deserializer)?;
    Ok(raw
        .filter(|content| !content.parts.is_empty())
        .map(|content| Turn {
            role: content.role.unwrap_or(Role::Model),
            parts: content.parts,
        }))
}

/// Response for one generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// The first candidate's content, if the response carries any.
    pub fn first_content(&self) -> Option<&Turn> {
        self.candidates.first().and_then(|c| c.content.as_ref())
    }
}

/// Errors from upstream model calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("model overloaded: {0}")]
    Overloaded(String),

    #[error("response from the model contained no candidates")]
    EmptyResponse,

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl LlmError {
    /// Whether this failure signals temporary unavailability worth retrying.
    ///
    /// Explicit unavailable/overloaded/empty variants always qualify. Any
    /// other variant qualifies only when its text carries an unavailability
    /// signal (`503`, `overloaded`, `unavailable`).
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Unavailable(_) | LlmError::Overloaded(_) | LlmError::EmptyResponse => true,
            other => mentions_unavailability(&other.to_string()),
        }
    }
}

fn mentions_unavailability(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("503") || lower.contains("overloaded") || lower.contains("unavailable")
}
