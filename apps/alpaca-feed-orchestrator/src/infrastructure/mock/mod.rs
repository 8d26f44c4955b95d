//! Mock streaming clients for testing.
//!
//! `MockStreamClientFactory` hands out `MockStreamClient`s whose
//! authentication outcome is scripted per environment. Every client built
//! is recorded, and a `MockClientHandle` lets tests raise events on a
//! specific client after the orchestrator has taken ownership of it.
//!
//! Compiled for unit tests and behind the `test-util` feature.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ClientEvent, ClientEventSink, EndpointConfig, StreamClientError, StreamingClient,
    StreamingClientFactory,
};
use crate::domain::connection::AuthStatus;
use crate::domain::endpoint::{AssetClass, Credentials, Environment};
use crate::infrastructure::alpaca::default_endpoint_config;

type Outcome = Result<AuthStatus, StreamClientError>;

// =============================================================================
// Client
// =============================================================================

struct MockClientState {
    config: EndpointConfig,
    outcome: Outcome,
    sinks: Mutex<Vec<Arc<dyn ClientEventSink>>>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    disposed: AtomicBool,
}

impl MockClientState {
    fn emit(&self, event: &ClientEvent) {
        let sinks = self.sinks.lock().clone();
        for sink in sinks {
            sink.on_event(event.clone());
        }
    }
}

/// Streaming client that answers with a scripted outcome.
///
/// On connect it raises `SocketOpened` and then `Connected(status)` before
/// returning the status, the same order a real stream reports them.
pub struct MockStreamClient {
    state: Arc<MockClientState>,
}

#[async_trait]
impl StreamingClient for MockStreamClient {
    async fn connect_and_authenticate(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AuthStatus, StreamClientError> {
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(StreamClientError::Cancelled);
        }

        let status = self.state.outcome.clone()?;
        self.state.emit(&ClientEvent::SocketOpened);
        self.state.emit(&ClientEvent::Connected(status));
        Ok(status)
    }

    async fn disconnect(&self, cancel: &CancellationToken) -> Result<(), StreamClientError> {
        self.state.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(StreamClientError::Cancelled);
        }
        self.state.emit(&ClientEvent::SocketClosed);
        Ok(())
    }

    fn subscribe(&self, sink: Arc<dyn ClientEventSink>) {
        self.state.sinks.lock().push(sink);
    }

    fn unsubscribe(&self, sink: &Arc<dyn ClientEventSink>) {
        self.state
            .sinks
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, sink));
    }
}

impl Drop for MockStreamClient {
    fn drop(&mut self) {
        self.state.disposed.store(true, Ordering::SeqCst);
    }
}

/// Test-side view of a client the factory built.
#[derive(Clone)]
pub struct MockClientHandle {
    state: Arc<MockClientState>,
}

impl MockClientHandle {
    /// Configuration the client was instantiated from.
    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.state.config
    }

    /// Environment the client was built for.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.state.config.environment
    }

    /// Raise an event to the client's current subscribers.
    pub fn emit(&self, event: ClientEvent) {
        self.state.emit(&event);
    }

    /// Number of sinks currently subscribed.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.sinks.lock().len()
    }

    /// Number of connect calls.
    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.state.connect_calls.load(Ordering::SeqCst)
    }

    /// Number of disconnect calls.
    #[must_use]
    pub fn disconnect_calls(&self) -> usize {
        self.state.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Whether the owner has dropped the client.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MockClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClientHandle")
            .field("url", &self.state.config.url)
            .field("environment", &self.state.config.environment)
            .field("subscribers", &self.subscriber_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Factory with per-environment scripted outcomes.
///
/// Environments without a script authorize. Default configurations come
/// from the Alpaca endpoint catalog. An environment scripted with a factory
/// error gets no client at all.
#[derive(Default)]
pub struct MockStreamClientFactory {
    outcomes: Mutex<HashMap<Environment, Outcome>>,
    build_errors: Mutex<HashMap<Environment, StreamClientError>>,
    clients: Mutex<Vec<MockClientHandle>>,
}

impl MockStreamClientFactory {
    /// Create a factory where every environment authorizes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the status clients for `environment` authenticate with.
    #[must_use]
    pub fn with_status(self, environment: Environment, status: AuthStatus) -> Self {
        self.set_outcome(environment, Ok(status));
        self
    }

    /// Script clients for `environment` to fail with `error`.
    #[must_use]
    pub fn with_error(self, environment: Environment, error: StreamClientError) -> Self {
        self.set_outcome(environment, Err(error));
        self
    }

    /// Refuse to build clients for `environment`, failing with `error`.
    #[must_use]
    pub fn with_factory_error(self, environment: Environment, error: StreamClientError) -> Self {
        self.set_factory_error(environment, error);
        self
    }

    /// Change the script for clients built from now on.
    pub fn set_status(&self, environment: Environment, status: AuthStatus) {
        self.set_outcome(environment, Ok(status));
    }

    /// Refuse to build clients for `environment` from now on.
    pub fn set_factory_error(&self, environment: Environment, error: StreamClientError) {
        self.build_errors.lock().insert(environment, error);
    }

    fn set_outcome(&self, environment: Environment, outcome: Outcome) {
        self.outcomes.lock().insert(environment, outcome);
    }

    /// Every client built so far, oldest first.
    #[must_use]
    pub fn clients(&self) -> Vec<MockClientHandle> {
        self.clients.lock().clone()
    }

    /// The most recently built client.
    #[must_use]
    pub fn last_client(&self) -> Option<MockClientHandle> {
        self.clients.lock().last().cloned()
    }

    /// Environments of every client built so far, oldest first.
    #[must_use]
    pub fn attempted_environments(&self) -> Vec<Environment> {
        self.clients
            .lock()
            .iter()
            .map(MockClientHandle::environment)
            .collect()
    }

    /// Stream addresses of every client built so far, oldest first.
    #[must_use]
    pub fn attempted_urls(&self) -> Vec<String> {
        self.clients
            .lock()
            .iter()
            .map(|client| client.config().url.clone())
            .collect()
    }
}

impl StreamingClientFactory for MockStreamClientFactory {
    fn default_config(
        &self,
        asset_class: AssetClass,
        environment: Environment,
        credentials: &Credentials,
    ) -> Result<EndpointConfig, StreamClientError> {
        default_endpoint_config(asset_class, environment, credentials)
    }

    fn create_client(
        &self,
        config: EndpointConfig,
    ) -> Result<Box<dyn StreamingClient>, StreamClientError> {
        if let Some(error) = self.build_errors.lock().get(&config.environment) {
            return Err(error.clone());
        }

        let outcome = self
            .outcomes
            .lock()
            .get(&config.environment)
            .cloned()
            .unwrap_or(Ok(AuthStatus::Authorized));

        let state = Arc::new(MockClientState {
            config,
            outcome,
            sinks: Mutex::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
        });
        self.clients.lock().push(MockClientHandle {
            state: Arc::clone(&state),
        });

        Ok(Box::new(MockStreamClient { state }))
    }
}
