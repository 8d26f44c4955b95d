//! Streaming Connection Orchestrator
//!
//! Owns at most one streaming client and walks the candidate environments
//! until one authenticates.
//!
//! # Fallback
//!
//! ```text
//! connect_and_authenticate
//!   for env in candidates            [Live, Paper] until pinned
//!     release old client             unsubscribe + drop
//!     build client for env           default client, or override address
//!     subscribe forwarder
//!     await authentication
//!       authorized   -> pin env, return
//!       otherwise    -> EnvironmentFailure (equity/option only), next env
//!   exhausted -> return last status
//! ```
//!
//! A custom endpoint pins the candidates at construction, so fallback never
//! happens with an override.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ClientEventSink, StreamClientError, StreamingClient, StreamingClientFactory,
};
use crate::application::services::forwarding::{EventForwarder, StreamEvents};
use crate::domain::connection::{AuthStatus, OrchestratorState};
use crate::domain::endpoint::{
    AssetClass, AssetFamily, CandidateEnvironments, Credentials, Environment,
};
use crate::infrastructure::broadcast::{DEFAULT_EVENT_CAPACITY, StreamEvent};
use crate::infrastructure::config::OrchestratorConfig;
use crate::infrastructure::metrics;

/// Environment a custom endpoint is pinned to.
const OVERRIDE_ENVIRONMENT: Environment = Environment::Live;

/// Errors that end a connect call.
///
/// A rejected candidate is not an error; it is reported through
/// `StreamEvent::EnvironmentFailure` and the returned `AuthStatus`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// The asset class has no streaming family.
    #[error("unsupported asset class: {0}")]
    UnsupportedAssetClass(AssetClass),

    /// The orchestrator does not offer this operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The factory or the active client failed.
    #[error(transparent)]
    Client(#[from] StreamClientError),
}

struct ActiveClient {
    environment: Environment,
    client: Box<dyn StreamingClient>,
}

/// A client built for one candidate plus the degradation notice to raise if
/// it is rejected.
struct CandidateClient {
    client: Box<dyn StreamingClient>,
    failure_message: Option<String>,
}

/// Connection and authentication orchestrator with paid-to-free feed
/// fallback.
///
/// `connect_and_authenticate` takes `&mut self`, so only one reconnect can be
/// in flight per orchestrator. Use [`events`](Self::events) to observe the
/// stream from elsewhere while a reconnect runs.
pub struct StreamingConnectionOrchestrator {
    factory: Arc<dyn StreamingClientFactory>,
    credentials: Credentials,
    asset_class: AssetClass,
    endpoint_override: Option<String>,
    candidates: CandidateEnvironments,
    active: Option<ActiveClient>,
    forwarder: Arc<EventForwarder>,
    state: OrchestratorState,
}

impl StreamingConnectionOrchestrator {
    /// Create an orchestrator. Performs no I/O.
    ///
    /// A non-empty `endpoint_override` disables tier fallback.
    #[must_use]
    pub fn new(
        factory: Arc<dyn StreamingClientFactory>,
        credentials: Credentials,
        asset_class: AssetClass,
        endpoint_override: Option<String>,
    ) -> Self {
        Self::with_event_capacity(
            factory,
            credentials,
            asset_class,
            endpoint_override,
            DEFAULT_EVENT_CAPACITY,
        )
    }

    /// Create an orchestrator from loaded configuration.
    #[must_use]
    pub fn from_config(
        factory: Arc<dyn StreamingClientFactory>,
        config: &OrchestratorConfig,
    ) -> Self {
        Self::with_event_capacity(
            factory,
            config.credentials.clone(),
            config.asset_class,
            config.endpoint_override.clone(),
            config.event_capacity,
        )
    }

    fn with_event_capacity(
        factory: Arc<dyn StreamingClientFactory>,
        credentials: Credentials,
        asset_class: AssetClass,
        endpoint_override: Option<String>,
        event_capacity: usize,
    ) -> Self {
        let endpoint_override = endpoint_override.filter(|url| !url.trim().is_empty());

        let mut candidates = CandidateEnvironments::default();
        if let Some(url) = &endpoint_override {
            candidates.pin(OVERRIDE_ENVIRONMENT);
            tracing::info!(
                url = %url,
                asset_class = asset_class.as_str(),
                "Using custom data stream endpoint; feed tier fallback disabled"
            );
        }

        Self {
            factory,
            credentials,
            asset_class,
            endpoint_override,
            candidates,
            active: None,
            forwarder: Arc::new(EventForwarder::new(event_capacity, asset_class)),
            state: OrchestratorState::Idle,
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Connect and authenticate, falling back from the paid to the free tier.
    ///
    /// Returns `Ok(AuthStatus::Authorized)` once a candidate authenticates,
    /// which also pins the candidates to that environment. When every
    /// candidate is rejected the last status is returned; exhaustion is not
    /// an error.
    ///
    /// # Errors
    ///
    /// - `UnsupportedAssetClass` if the asset class has no stream; not retried.
    /// - `Client` if the factory fails, or the client fails at the transport
    ///   level or observes `cancel`. The loop stops at that candidate.
    pub async fn connect_and_authenticate(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<AuthStatus, OrchestratorError> {
        let family = self
            .asset_class
            .family()
            .ok_or(OrchestratorError::UnsupportedAssetClass(self.asset_class))?;

        let mut last_status = AuthStatus::Unauthorized;
        let candidates = self.candidates;

        for &environment in candidates.as_slice() {
            self.release_active_client();
            self.state = OrchestratorState::Connecting(environment);

            let CandidateClient {
                client,
                failure_message,
            } = match self.build_client(family, environment) {
                Ok(candidate) => candidate,
                Err(e) => {
                    tracing::warn!(
                        environment = environment.as_str(),
                        error = %e,
                        "Data stream client could not be built"
                    );
                    self.state = OrchestratorState::Failed(environment);
                    return Err(e.into());
                }
            };

            tracing::info!(
                environment = environment.as_str(),
                tier = environment.tier().as_str(),
                asset_class = self.asset_class.as_str(),
                "Connecting to data stream"
            );
            metrics::record_connect_attempt(environment, self.asset_class);

            let started = Instant::now();
            let result = self
                .bind_client(environment, client)
                .connect_and_authenticate(cancel)
                .await;
            metrics::record_attempt_duration(environment, started.elapsed());

            let status = match result {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(
                        environment = environment.as_str(),
                        error = %e,
                        "Data stream connection failed"
                    );
                    self.state = OrchestratorState::Failed(environment);
                    return Err(e.into());
                }
            };
            last_status = status;

            if status.is_authorized() {
                self.candidates.pin(environment);
                self.state = OrchestratorState::Authorized(environment);
                metrics::record_authorization(environment);
                tracing::info!(
                    environment = environment.as_str(),
                    tier = environment.tier().as_str(),
                    "Data stream authenticated"
                );
                return Ok(status);
            }

            self.state = OrchestratorState::Unauthorized(environment);
            tracing::debug!(
                environment = environment.as_str(),
                status = status.as_str(),
                "Data stream rejected authentication"
            );

            if let Some(message) = failure_message {
                tracing::warn!(environment = environment.as_str(), "{message}");
                metrics::record_environment_failure(environment);
                self.forwarder.notify_environment_failure(message);
            }
        }

        self.state = OrchestratorState::Exhausted;
        tracing::warn!(
            status = last_status.as_str(),
            asset_class = self.asset_class.as_str(),
            "No data stream environment authorized"
        );
        Ok(last_status)
    }

    /// Disconnect the active client, if any.
    ///
    /// # Errors
    ///
    /// Returns `Client` if the client fails to disconnect.
    pub async fn disconnect(&self, cancel: &CancellationToken) -> Result<(), OrchestratorError> {
        if let Some(active) = &self.active {
            tracing::info!(
                environment = active.environment.as_str(),
                "Disconnecting data stream"
            );
            active.client.disconnect(cancel).await?;
        }
        Ok(())
    }

    /// Connect without authenticating. Not supported.
    ///
    /// # Errors
    ///
    /// Always returns `Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn connect(&self, _cancel: &CancellationToken) -> Result<(), OrchestratorError> {
        Err(OrchestratorError::Unsupported(
            "connect without authentication; use connect_and_authenticate",
        ))
    }

    /// Release the active client and consume the orchestrator.
    pub fn dispose(mut self) {
        self.release_active_client();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// True iff the last `Connected` event reported authorized and no
    /// `SocketClosed` has arrived since.
    #[must_use]
    pub fn is_open_and_authorized(&self) -> bool {
        self.forwarder.is_open_and_authorized()
    }

    /// Handle to the event surface that outlives client swaps.
    #[must_use]
    pub fn events(&self) -> StreamEvents {
        StreamEvents::new(Arc::clone(&self.forwarder))
    }

    /// Get a new event receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.forwarder.subscribe()
    }

    /// Environments the next connect will try, in order.
    #[must_use]
    pub const fn candidates(&self) -> &CandidateEnvironments {
        &self.candidates
    }

    /// Environment of the active client, if any.
    #[must_use]
    pub fn active_environment(&self) -> Option<Environment> {
        self.active.as_ref().map(|active| active.environment)
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Asset class fixed at construction.
    #[must_use]
    pub const fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    /// Custom stream address, if one is in use.
    #[must_use]
    pub fn endpoint_override(&self) -> Option<&str> {
        self.endpoint_override.as_deref()
    }

    // =========================================================================
    // Client Lifecycle
    // =========================================================================

    fn build_client(
        &self,
        family: AssetFamily,
        environment: Environment,
    ) -> Result<CandidateClient, StreamClientError> {
        if let Some(url) = &self.endpoint_override {
            let config = self
                .factory
                .default_config(self.asset_class, environment, &self.credentials)?
                .with_url(url.as_str());
            return Ok(CandidateClient {
                client: self.factory.create_client(config)?,
                failure_message: None,
            });
        }

        Ok(CandidateClient {
            client: self
                .factory
                .default_client(self.asset_class, environment, &self.credentials)?,
            failure_message: tier_failure_message(family, environment),
        })
    }

    /// Subscribe the forwarder to `client` and make it the active client.
    fn bind_client(
        &mut self,
        environment: Environment,
        client: Box<dyn StreamingClient>,
    ) -> &dyn StreamingClient {
        client.subscribe(self.sink());
        tracing::debug!(environment = environment.as_str(), "Bound data stream client");

        let active = self.active.insert(ActiveClient {
            environment,
            client,
        });
        active.client.as_ref()
    }

    /// Unsubscribe the forwarder from the active client and drop it.
    fn release_active_client(&mut self) {
        if let Some(active) = self.active.take() {
            active.client.unsubscribe(&self.sink());
            tracing::debug!(
                environment = active.environment.as_str(),
                "Released data stream client"
            );
        }
    }

    fn sink(&self) -> Arc<dyn ClientEventSink> {
        Arc::clone(&self.forwarder) as Arc<dyn ClientEventSink>
    }
}

impl Drop for StreamingConnectionOrchestrator {
    fn drop(&mut self) {
        self.release_active_client();
    }
}

impl std::fmt::Debug for StreamingConnectionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingConnectionOrchestrator")
            .field("asset_class", &self.asset_class)
            .field("endpoint_override", &self.endpoint_override)
            .field("candidates", &self.candidates)
            .field("active_environment", &self.active_environment())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Degradation notice for a rejected tier, or `None` when the family has a
/// single feed.
fn tier_failure_message(family: AssetFamily, environment: Environment) -> Option<String> {
    if !family.has_tiered_feeds() {
        return None;
    }
    let feed = family.data_feed(environment);
    Some(format!(
        "Unable to authenticate to the {environment} environment ({} tier, {} feed); \
         the data subscription may not be entitled",
        environment.tier(),
        feed.display_name(),
    ))
}
