//! LlmProvider trait definition.
//!
//! This is the single abstraction the assistant depends on for upstream
//! calls. The wire protocol behind it is opaque to core.

use sera_types::llm::{GenerateRequest, GenerateResponse, LlmError};

/// Trait for upstream model backends (Gemini, test stubs, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in sera-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send one generation request and receive the full response.
    ///
    /// A response with zero candidates is returned as `Ok`; deciding what
    /// that means is the caller's job.
    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl std::future::Future<Output = Result<GenerateResponse, LlmError>> + Send;
}
