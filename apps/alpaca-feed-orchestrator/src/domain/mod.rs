//! Domain Layer - Endpoint selection and connection state.
//!
//! Pure types with no I/O: which environments to try, which feed each one
//! serves, and how an authentication attempt turned out.

/// Connection outcomes and orchestrator lifecycle state.
pub mod connection;

/// Environments, feed tiers, asset classes and candidate lists.
pub mod endpoint;
