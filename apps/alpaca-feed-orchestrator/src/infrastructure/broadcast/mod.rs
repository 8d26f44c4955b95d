//! Event Broadcast
//!
//! Fans orchestrator events out to any number of subscribers using a tokio
//! broadcast channel. Subscribing is taking a receiver; unsubscribing is
//! dropping it.
//!
//! Delivery is best-effort: a subscriber that falls more than the channel
//! capacity behind observes `RecvError::Lagged` and skips ahead.

use tokio::sync::broadcast;

use crate::application::ports::StreamClientError;
use crate::domain::connection::AuthStatus;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// =============================================================================
// Stream Events
// =============================================================================

/// Event published under the orchestrator's identity.
///
/// Every variant except `EnvironmentFailure` is forwarded from whichever
/// client is currently active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
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
    /// A feed tier was unavailable and a lower tier will be tried.
    EnvironmentFailure(String),
}

impl StreamEvent {
    /// Event name for logs and metric labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::SocketOpened => "socket_opened",
            Self::SocketClosed => "socket_closed",
            Self::Error(_) => "error",
            Self::Warning(_) => "warning",
            Self::EnvironmentFailure(_) => "environment_failure",
        }
    }
}

// =============================================================================
// Event Hub
// =============================================================================

/// Multi-subscriber fan-out for [`StreamEvent`]s.
///
/// # Example
///
/// ```rust
/// use alpaca_feed_orchestrator::infrastructure::broadcast::{EventHub, StreamEvent};
///
/// let hub = EventHub::with_defaults();
/// let mut rx = hub.subscribe();
///
/// assert_eq!(hub.send(StreamEvent::SocketOpened), Some(1));
/// assert_eq!(rx.try_recv().ok(), Some(StreamEvent::SocketOpened));
/// ```
#[derive(Debug)]
pub struct EventHub {
    tx: broadcast::Sender<StreamEvent>,
}

impl EventHub {
    /// Create a hub with the given channel capacity (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity.max(1)).0,
        }
    }

    /// Create a hub with the default capacity.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of receivers that got the event, or `None` if
    /// nobody is subscribed.
    #[must_use]
    pub fn send(&self, event: StreamEvent) -> Option<usize> {
        self.tx.send(event).ok()
    }

    /// Get a new receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.tx.subscribe()
    }

    /// Get the number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::with_defaults()
    }
}
