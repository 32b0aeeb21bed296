//! Shared domain types for the Sera chat relay.
//!
//! Conversation turns and histories, upstream request/response shapes, the
//! upstream error taxonomy, and relay configuration.
//!
//! Zero infrastructure dependencies -- only serde, uuid, thiserror.

pub mod config;
pub mod conversation;
pub mod llm;
