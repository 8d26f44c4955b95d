//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the Alpaca endpoint catalog, the event fan-out, and
//! the ambient configuration, logging and metrics support.

/// Alpaca stream endpoints and reconnect backoff.
pub mod alpaca;

/// Broadcast channel for orchestrator events.
pub mod broadcast;

/// Configuration loaded from environment variables.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Scripted in-memory streaming clients.
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

/// Tracing subscriber initialization.
pub mod telemetry;
