//! HTTP layer for the Sera relay.
//!
//! Axum router with both chat variants, a landing page, health check, and
//! credentialed CORS for an allow-list of origins.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
