//! Port Interfaces
//!
//! Contracts the orchestrator drives. These are the seams to the wrapped
//! streaming client, which owns socket framing, heartbeats and message
//! parsing.
//!
//! ## Driven Ports (Outbound)
//!
//! - `StreamingClient`: One connection to a market data stream
//! - `StreamingClientFactory`: Builds clients keyed by (asset class, environment)
//! - `ClientEventSink`: Receives a client's connection callbacks

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::connection::AuthStatus;
use crate::domain::endpoint::{AssetClass, Credentials, Environment};

// =============================================================================
// Error Type
// =============================================================================

/// Errors reported by a streaming client or its factory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamClientError {
    /// WebSocket connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Transport failure on an established connection.
    #[error("transport error: {0}")]
    Transport(String),

    /// The factory cannot build a client for this configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,
}

// =============================================================================
// Client Events
// =============================================================================

/// Callback raised by a streaming client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Authentication finished with this status.
    Connected(AuthStatus),
    /// Underlying socket opened.
    SocketOpened,
    /// Underlying socket closed.
    SocketClosed,
    /// Transport-level error.
    Error(StreamClientError),
    /// Non-fatal warning from the stream.
    Warning(String),
}

impl ClientEvent {
    /// Event name for logs and metric labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::SocketOpened => "socket_opened",
            Self::SocketClosed => "socket_closed",
            Self::Error(_) => "error",
            Self::Warning(_) => "warning",
        }
    }
}

/// Observer of a single client's events.
///
/// Implementations are called synchronously from the client's I/O task, so
/// they must not block.
#[cfg_attr(test, mockall::automock)]
pub trait ClientEventSink: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: ClientEvent);
}

// =============================================================================
// Endpoint Configuration
// =============================================================================

/// Configuration a client is instantiated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Asset class the stream serves.
    pub asset_class: AssetClass,
    /// Environment the configuration was derived for.
    pub environment: Environment,
    /// WebSocket URL.
    pub url: String,
    /// API credentials.
    pub credentials: Credentials,
}

impl EndpointConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(
        asset_class: AssetClass,
        environment: Environment,
        url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            asset_class,
            environment,
            url: url.into(),
            credentials,
        }
    }

    /// Replace the stream address.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

// =============================================================================
// Streaming Client
// =============================================================================

/// One connection to a market data stream.
///
/// Dropping the client releases its resources.
#[async_trait]
pub trait StreamingClient: Send + Sync {
    /// Open the socket and authenticate.
    ///
    /// Honors `cancel` while waiting on the transport.
    async fn connect_and_authenticate(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AuthStatus, StreamClientError>;

    /// Close the socket.
    async fn disconnect(&self, cancel: &CancellationToken) -> Result<(), StreamClientError>;

    /// Start delivering events to `sink`.
    fn subscribe(&self, sink: Arc<dyn ClientEventSink>);

    /// Stop delivering events to `sink`.
    fn unsubscribe(&self, sink: &Arc<dyn ClientEventSink>);
}

/// Builds streaming clients keyed by asset class and environment.
pub trait StreamingClientFactory: Send + Sync {
    /// Default configuration for the pair; its `url` may be overridden
    /// before instantiation.
    fn default_config(
        &self,
        asset_class: AssetClass,
        environment: Environment,
        credentials: &Credentials,
    ) -> Result<EndpointConfig, StreamClientError>;

    /// Instantiate a client from a configuration.
    fn create_client(
        &self,
        config: EndpointConfig,
    ) -> Result<Box<dyn StreamingClient>, StreamClientError>;

    /// The environment's default client for the pair.
    fn default_client(
        &self,
        asset_class: AssetClass,
        environment: Environment,
        credentials: &Credentials,
    ) -> Result<Box<dyn StreamingClient>, StreamClientError> {
        let config = self.default_config(asset_class, environment, credentials)?;
        self.create_client(config)
    }
}
