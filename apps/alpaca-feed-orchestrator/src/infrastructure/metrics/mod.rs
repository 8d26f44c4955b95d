//! Prometheus Metrics Module
//!
//! Exposes orchestrator metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Attempts**: Connect attempts per environment and asset class
//! - **Fallback**: Feed-tier degradations and successful authorizations
//! - **Status**: Whether the active stream is open and authorized
//! - **Events**: Events forwarded from the active client
//! - **Latency**: Time spent authenticating against one candidate

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::endpoint::{AssetClass, Environment};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if another global recorder is already installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            #[allow(clippy::expect_used)]
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "feed_orchestrator_connect_attempts_total",
        "Connect-and-authenticate attempts per candidate environment"
    );
    describe_counter!(
        "feed_orchestrator_environment_failures_total",
        "Feed tiers reported unavailable before falling back"
    );
    describe_counter!(
        "feed_orchestrator_authorizations_total",
        "Successful authorizations per environment"
    );
    describe_gauge!(
        "feed_orchestrator_authorized",
        "1 when the active stream is open and authorized, otherwise 0"
    );
    describe_counter!(
        "feed_orchestrator_events_forwarded_total",
        "Client events re-emitted to orchestrator subscribers"
    );
    describe_histogram!(
        "feed_orchestrator_attempt_seconds",
        "Time spent authenticating against one candidate"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a connect attempt against one candidate.
pub fn record_connect_attempt(environment: Environment, asset_class: AssetClass) {
    counter!(
        "feed_orchestrator_connect_attempts_total",
        "environment" => environment.as_str(),
        "asset_class" => asset_class.as_str()
    )
    .increment(1);
}

/// Record a feed-tier degradation.
pub fn record_environment_failure(environment: Environment) {
    counter!(
        "feed_orchestrator_environment_failures_total",
        "environment" => environment.as_str()
    )
    .increment(1);
}

/// Record a successful authorization.
pub fn record_authorization(environment: Environment) {
    counter!(
        "feed_orchestrator_authorizations_total",
        "environment" => environment.as_str()
    )
    .increment(1);
}

/// Update the authorized gauge for one asset class.
pub fn set_authorized(asset_class: AssetClass, authorized: bool) {
    gauge!(
        "feed_orchestrator_authorized",
        "asset_class" => asset_class.as_str()
    )
    .set(if authorized { 1.0 } else { 0.0 });
}

/// Record a forwarded client event.
pub fn record_event_forwarded(event: &'static str) {
    counter!(
        "feed_orchestrator_events_forwarded_total",
        "event" => event
    )
    .increment(1);
}

/// Record how long one candidate took to answer.
pub fn record_attempt_duration(environment: Environment, duration: Duration) {
    histogram!(
        "feed_orchestrator_attempt_seconds",
        "environment" => environment.as_str()
    )
    .record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
