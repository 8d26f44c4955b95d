//! Application Services
//!
//! Services that coordinate the streaming client ports.
//!
//! - `StreamingConnectionOrchestrator`: Connects with paid-to-free feed fallback
//! - `EventForwarder`: Re-emits the active client's events
//! - `ReconnectSupervisor`: Reconnects with backoff after the stream closes

mod forwarding;
mod orchestrator;
mod supervisor;

pub use forwarding::{EventForwarder, StreamEvents};
pub use orchestrator::{OrchestratorError, StreamingConnectionOrchestrator};
pub use supervisor::{ReconnectSupervisor, SupervisorError};
