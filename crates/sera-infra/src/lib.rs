//! Infrastructure layer for the Sera relay.
//!
//! Contains implementations of the ports defined in `sera-core`: the
//! DashMap-backed conversation store and the Gemini HTTP provider, plus the
//! outbound callback client and the configuration loader.

pub mod callback;
pub mod config;
pub mod llm;
pub mod store;
