//! Tracing Initialization
//!
//! Installs a `tracing-subscriber` fmt layer filtered by `EnvFilter`. The
//! library only emits `tracing` events; embedding applications call
//! [`init`] once at startup or install their own subscriber.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Filter directives (default: `alpaca_feed_orchestrator=info`)
//!
//! # Usage
//!
//! ```ignore
//! use alpaca_feed_orchestrator::infrastructure::telemetry;
//!
//! telemetry::init()?;
//! tracing::info!("Starting feed orchestrator");
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter directives.
const DEFAULT_FILTER: &str = "alpaca_feed_orchestrator=info";

/// Telemetry errors.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Filter directives could not be parsed.
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialized: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives.
    pub filter: String,
    /// Include the event target in each line.
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let filter = std::env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self {
            filter,
            ..Self::default()
        }
    }
}

/// Initialize tracing with configuration from the environment.
///
/// # Errors
///
/// See [`init_with_config`].
pub fn init() -> Result<(), TelemetryError> {
    init_with_config(&TelemetryConfig::from_env())
}

/// Initialize tracing with custom configuration.
///
/// # Errors
///
/// Returns an error if the filter is malformed or a global subscriber is
/// already installed.
pub fn init_with_config(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.filter)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
