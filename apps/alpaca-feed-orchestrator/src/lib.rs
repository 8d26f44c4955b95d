#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::items_after_statements
    )
)]

//! Alpaca Feed Orchestrator - Market Data Connection Fallback
//!
//! Connects to an Alpaca market data stream, trying the paid feed first and
//! falling back to the free feed, and keeps one stable event surface while
//! the underlying streaming client is swapped.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Endpoint selection and connection state
//!   - `endpoint`: Environments, feed tiers, asset classes, candidate lists
//!   - `connection`: Authentication status and orchestrator state
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Streaming client, client factory, event sink
//!   - `services`: Orchestrator, event forwarder, reconnect supervisor
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `alpaca`: Default stream addresses and reconnect backoff
//!   - `broadcast`: Event fan-out to any number of subscribers
//!   - `config`: Configuration from environment variables
//!   - `metrics`: Prometheus instrumentation
//!   - `mock`: Scripted in-memory clients (`test-util` feature)
//!   - `telemetry`: Tracing subscriber setup
//!
//! # Connection Flow
//!
//! ```text
//!                  ┌──────────────┐   Live (paid)    ┌────────────────┐
//! connect ───────► │ Orchestrator │ ───────────────► │ StreamingClient│
//!                  │              │   Paper (free)   │   (swapped)    │
//!                  └──────┬───────┘ ───────────────► └───────┬────────┘
//!                         │                                  │ events
//!                         ▼                                  ▼
//!                  ┌──────────────┐  StreamEvent   ┌────────────────┐
//!                  │   EventHub   │ ◄───────────── │ EventForwarder │
//!                  └──────┬───────┘                └────────────────┘
//!                         ├──► Subscriber 1
//!                         └──► Subscriber N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Endpoint and connection types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::connection::{AuthStatus, OrchestratorState};
pub use domain::endpoint::{
    AssetClass, AssetFamily, CandidateEnvironments, Credentials, DataFeed, Environment, FeedTier,
};

// Ports
pub use application::ports::{
    ClientEvent, ClientEventSink, EndpointConfig, StreamClientError, StreamingClient,
    StreamingClientFactory,
};

// Services
pub use application::services::{
    OrchestratorError, ReconnectSupervisor, StreamEvents, StreamingConnectionOrchestrator,
    SupervisorError,
};

// Broadcast
pub use infrastructure::broadcast::{EventHub, StreamEvent};

// Infrastructure config
pub use infrastructure::config::{ConfigError, OrchestratorConfig, ReconnectSettings};

// Alpaca endpoints and backoff
pub use infrastructure::alpaca::{ReconnectConfig, ReconnectPolicy, default_stream_url};

// Mock clients (for integration tests)
#[cfg(any(test, feature = "test-util"))]
pub use infrastructure::mock::{MockClientHandle, MockStreamClient, MockStreamClientFactory};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryError, init as init_telemetry};
