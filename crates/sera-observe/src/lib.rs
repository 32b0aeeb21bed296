//! Observability setup for the Sera relay.

pub mod tracing_setup;
