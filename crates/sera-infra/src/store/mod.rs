//! Conversation store implementations.

pub mod memory;

pub use memory::InMemoryConversationStore;
