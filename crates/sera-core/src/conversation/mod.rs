//! Per-user conversation history storage abstraction.
//!
//! This module defines the `ConversationStore` trait the infrastructure
//! layer implements. The assistant only ever talks to this trait, so the
//! backing (in-process map, external key-value store with TTL) can change
//! without touching it.

pub mod store;
