//! Google Gemini `generateContent` provider.

pub mod client;
pub mod types;

pub use client::GeminiProvider;
