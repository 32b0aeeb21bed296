//! The assistant invoker and its building blocks.
//!
//! - `retry`: pure retry state machine and outcome classification
//! - `prompt`: system instruction with a fresh localized timestamp
//! - `render`: Markdown to HTML
//! - `service`: `Assistant`, which drives one exchange end to end

pub mod prompt;
pub mod render;
pub mod retry;
pub mod service;

pub use service::{Assistant, Reply};
