//! Business logic and port definitions for the Sera chat relay.
//!
//! This crate defines the "ports" (`ConversationStore`, `LlmProvider`) that
//! the infrastructure layer implements, plus the assistant that drives one
//! exchange over them. It depends only on `sera-types` -- never on
//! `sera-infra` or any HTTP crate.

pub mod assistant;
pub mod conversation;
pub mod llm;
