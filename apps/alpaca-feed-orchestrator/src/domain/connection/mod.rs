//! Connection State Types
//!
//! Authorization results reported by streaming clients and the lifecycle
//! state of the orchestrator's candidate loop.

use std::fmt;

use super::endpoint::Environment;

/// Result of a connect-and-authenticate exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStatus {
    /// Stream accepted the credentials.
    Authorized,
    /// Stream rejected the credentials or the subscription is not entitled.
    Unauthorized,
    /// Stream refused the connection because the limit is reached.
    TooManyConnections,
}

impl AuthStatus {
    /// Check if the stream is authorized.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Get the status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Unauthorized => "unauthorized",
            Self::TooManyConnections => "too_many_connections",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the orchestrator is in its candidate loop.
///
/// There is no `Disposed` variant: disposing consumes the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    /// No client has been bound yet.
    #[default]
    Idle,
    /// Awaiting authentication against an environment.
    Connecting(Environment),
    /// The environment authorized; sticky across reconnects.
    Authorized(Environment),
    /// The environment rejected the attempt.
    Unauthorized(Environment),
    /// Building the client or connecting to the environment failed.
    Failed(Environment),
    /// Every candidate was tried without authorization.
    Exhausted,
}

impl OrchestratorState {
    /// Environment involved in the current state, if any.
    #[must_use]
    pub const fn environment(&self) -> Option<Environment> {
        match self {
            Self::Connecting(env)
            | Self::Authorized(env)
            | Self::Unauthorized(env)
            | Self::Failed(env) => Some(*env),
            Self::Idle | Self::Exhausted => None,
        }
    }

    /// Check if the last attempt authorized.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}
