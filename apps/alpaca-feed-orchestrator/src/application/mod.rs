//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the orchestration services and the port interfaces
//! that define how they drive a streaming client.

/// Port interfaces for streaming clients and their factory.
pub mod ports;

/// Orchestration, event forwarding and reconnect supervision.
pub mod services;
