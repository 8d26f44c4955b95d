//! Reconnect Supervisor
//!
//! Keeps an orchestrator authorized: connects, waits for the socket to close,
//! then reconnects with exponential backoff. The orchestrator never retries on
//! its own, so callers that want a self-healing stream run this loop.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::application::ports::StreamClientError;
use crate::application::services::forwarding::StreamEvents;
use crate::application::services::orchestrator::{
    OrchestratorError, StreamingConnectionOrchestrator,
};
use crate::domain::connection::AuthStatus;
use crate::infrastructure::alpaca::{ReconnectConfig, ReconnectPolicy};
use crate::infrastructure::broadcast::StreamEvent;

/// Errors that end a supervised session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SupervisorError {
    /// The backoff policy ran out of retries.
    #[error("maximum reconnection attempts ({0}) exceeded")]
    MaxAttemptsExceeded(u32),

    /// The orchestrator reported an error that retrying cannot fix.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// How a wait on an authorized session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Closed,
    Cancelled,
}

/// Reconnect loop around a [`StreamingConnectionOrchestrator`].
#[derive(Debug)]
pub struct ReconnectSupervisor {
    policy: ReconnectPolicy,
}

impl ReconnectSupervisor {
    /// Create a supervisor with the given backoff configuration.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self {
            policy: ReconnectPolicy::new(config),
        }
    }

    /// Retries made since the last successful authorization.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.policy.attempt_count()
    }

    /// Run until `cancel` fires or the policy gives up.
    ///
    /// Rejected candidates and transport errors are retried. Backoff resets
    /// each time a connection authorizes.
    ///
    /// # Errors
    ///
    /// - `MaxAttemptsExceeded` once the policy hands out no more delays.
    /// - `Orchestrator` for errors retrying cannot fix, such as an
    ///   unsupported asset class.
    pub async fn run(
        &mut self,
        orchestrator: &mut StreamingConnectionOrchestrator,
        cancel: &CancellationToken,
    ) -> Result<(), SupervisorError> {
        let events = orchestrator.events();

        loop {
            if cancel.is_cancelled() {
                tracing::info!("Feed supervisor cancelled");
                return Ok(());
            }

            match orchestrator.connect_and_authenticate(cancel).await {
                Ok(AuthStatus::Authorized) => {
                    self.policy.reset();

                    let mut rx = events.subscribe();
                    if events.is_open_and_authorized()
                        && wait_for_close(&events, &mut rx, cancel).await == SessionEnd::Cancelled
                    {
                        tracing::info!("Feed supervisor cancelled");
                        return Ok(());
                    }
                    tracing::warn!("Data stream closed; reconnecting");
                }
                Ok(status) => {
                    tracing::warn!(status = status.as_str(), "Data stream not authorized");
                }
                Err(OrchestratorError::Client(StreamClientError::Cancelled))
                    if cancel.is_cancelled() =>
                {
                    tracing::info!("Feed supervisor cancelled during connect");
                    return Ok(());
                }
                Err(OrchestratorError::Client(e)) => {
                    tracing::warn!(error = %e, "Data stream connection error");
                }
                Err(e) => return Err(e.into()),
            }

            let Some(delay) = self.policy.next_delay() else {
                return Err(SupervisorError::MaxAttemptsExceeded(
                    self.policy.attempt_count(),
                ));
            };
            tracing::info!(
                attempt = self.policy.attempt_count(),
                delay_ms = delay.as_millis(),
                "Reconnecting to data stream"
            );

            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("Feed supervisor cancelled during reconnect delay");
                    return Ok(());
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

async fn wait_for_close(
    events: &StreamEvents,
    rx: &mut broadcast::Receiver<StreamEvent>,
    cancel: &CancellationToken,
) -> SessionEnd {
    loop {
        tokio::select! {
            () = cancel.cancelled() => return SessionEnd::Cancelled,
            event = rx.recv() => match event {
                Ok(StreamEvent::SocketClosed) => return SessionEnd::Closed,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Supervisor event receiver lagged");
                    if !events.is_open_and_authorized() {
                        return SessionEnd::Closed;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return SessionEnd::Cancelled,
            },
        }
    }
}
