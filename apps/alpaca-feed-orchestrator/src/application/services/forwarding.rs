//! Event Forwarding
//!
//! The orchestrator's fixed forwarding handler. One instance lives for the
//! orchestrator's whole lifetime and is subscribed to whichever client is
//! active, so subscribers see a stable event surface across client swaps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

use crate::application::ports::{ClientEvent, ClientEventSink};
use crate::domain::endpoint::AssetClass;
use crate::infrastructure::broadcast::{EventHub, StreamEvent};
use crate::infrastructure::metrics;

/// Re-emits client events under the orchestrator's identity and tracks
/// whether the stream is open and authorized.
#[derive(Debug)]
pub struct EventForwarder {
    hub: EventHub,
    asset_class: AssetClass,
    authorized: AtomicBool,
}

impl EventForwarder {
    /// Create a forwarder with the given broadcast capacity.
    ///
    /// `asset_class` labels the authorized gauge.
    #[must_use]
    pub fn new(capacity: usize, asset_class: AssetClass) -> Self {
        Self {
            hub: EventHub::new(capacity),
            asset_class,
            authorized: AtomicBool::new(false),
        }
    }

    /// True iff the last `Connected` reported authorized and no
    /// `SocketClosed` has arrived since.
    #[must_use]
    pub fn is_open_and_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    /// Get a new event receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.hub.subscribe()
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.hub.receiver_count()
    }

    /// Announce that a feed tier was unavailable.
    pub fn notify_environment_failure(&self, message: String) {
        self.publish(StreamEvent::EnvironmentFailure(message));
    }

    fn set_authorized(&self, authorized: bool) {
        self.authorized.store(authorized, Ordering::SeqCst);
        metrics::set_authorized(self.asset_class, authorized);
    }

    fn publish(&self, event: StreamEvent) {
        metrics::record_event_forwarded(event.kind());
        let _ = self.hub.send(event);
    }
}

impl ClientEventSink for EventForwarder {
    fn on_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::Connected(status) => {
                self.set_authorized(status.is_authorized());
                tracing::info!(status = status.as_str(), "Stream connected");
                self.publish(StreamEvent::Connected(status));
            }
            ClientEvent::SocketClosed => {
                self.set_authorized(false);
                tracing::warn!("Stream socket closed");
                self.publish(StreamEvent::SocketClosed);
            }
            ClientEvent::SocketOpened => {
                tracing::debug!("Stream socket opened");
                self.publish(StreamEvent::SocketOpened);
            }
            ClientEvent::Warning(message) => {
                tracing::warn!(warning = %message, "Stream warning");
                self.publish(StreamEvent::Warning(message));
            }
            ClientEvent::Error(error) => {
                tracing::error!(error = %error, "Stream error");
                self.publish(StreamEvent::Error(error));
            }
        }
    }
}

/// Cloneable handle to the orchestrator's event surface.
///
/// Usable while a reconnect is in flight, since it does not borrow the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct StreamEvents {
    forwarder: Arc<EventForwarder>,
}

impl StreamEvents {
    pub(crate) const fn new(forwarder: Arc<EventForwarder>) -> Self {
        Self { forwarder }
    }

    /// Get a new event receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.forwarder.subscribe()
    }

    /// See [`EventForwarder::is_open_and_authorized`].
    #[must_use]
    pub fn is_open_and_authorized(&self) -> bool {
        self.forwarder.is_open_and_authorized()
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.forwarder.subscriber_count()
    }
}
