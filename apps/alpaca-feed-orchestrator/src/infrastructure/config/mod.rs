//! Configuration Module
//!
//! Configuration loading for the orchestrator.

mod settings;

pub use settings::{ConfigError, OrchestratorConfig, ReconnectSettings};
