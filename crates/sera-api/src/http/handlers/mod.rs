//! HTTP request handlers.

pub mod callback;
pub mod chat;
pub mod index;
