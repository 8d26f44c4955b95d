//! Orchestrator Configuration Settings
//!
//! Configuration types for the orchestrator, loaded from environment
//! variables.

use std::time::Duration;

use crate::domain::endpoint::{AssetClass, Credentials};
use crate::infrastructure::broadcast::DEFAULT_EVENT_CAPACITY;

/// Reconnect backoff settings for callers that supervise a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectSettings {
    /// Initial reconnection delay.
    pub delay_initial: Duration,
    /// Maximum reconnection delay.
    pub delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub delay_multiplier: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            delay_initial: Duration::from_millis(500),
            delay_max: Duration::from_secs(30),
            delay_multiplier: 2.0,
            max_attempts: 0,
        }
    }
}

/// Complete orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// API credentials.
    pub credentials: Credentials,
    /// Asset class to stream.
    pub asset_class: AssetClass,
    /// Custom stream address; disables tier fallback when set.
    pub endpoint_override: Option<String>,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Reconnect backoff settings.
    pub reconnect: ReconnectSettings,
}

impl OrchestratorConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new(credentials: Credentials, asset_class: AssetClass) -> Self {
        Self {
            credentials,
            asset_class,
            endpoint_override: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            reconnect: ReconnectSettings::default(),
        }
    }

    /// Set the custom stream address.
    #[must_use]
    pub fn with_endpoint_override(mut self, url: impl Into<String>) -> Self {
        self.endpoint_override = Some(url.into());
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Loads a `.env` file from the current directory first, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `ALPACA_KEY` or `ALPACA_SECRET` is missing or
    /// empty, or `ALPACA_ASSET_CLASS` names an unknown asset class.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, "ALPACA_KEY")?;
        let api_secret = required(&lookup, "ALPACA_SECRET")?;

        let asset_class = match lookup("ALPACA_ASSET_CLASS") {
            Some(value) if !value.trim().is_empty() => AssetClass::from_str_case_insensitive(&value)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "ALPACA_ASSET_CLASS".to_string(),
                    value,
                })?,
            _ => AssetClass::default(),
        };

        let endpoint_override = lookup("ALPACA_DATA_STREAM_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let defaults = ReconnectSettings::default();
        let reconnect = ReconnectSettings {
            delay_initial: parse_opt(&lookup, "FEED_ORCHESTRATOR_RECONNECT_DELAY_INITIAL_MS")
                .map_or(defaults.delay_initial, Duration::from_millis),
            delay_max: parse_opt(&lookup, "FEED_ORCHESTRATOR_RECONNECT_DELAY_MAX_SECS")
                .map_or(defaults.delay_max, Duration::from_secs),
            delay_multiplier: parse_or(
                &lookup,
                "FEED_ORCHESTRATOR_RECONNECT_DELAY_MULTIPLIER",
                defaults.delay_multiplier,
            ),
            max_attempts: parse_or(
                &lookup,
                "FEED_ORCHESTRATOR_MAX_RECONNECT_ATTEMPTS",
                defaults.max_attempts,
            ),
        };

        Ok(Self {
            credentials: Credentials::new(api_key, api_secret),
            asset_class,
            endpoint_override,
            event_capacity: parse_or(
                &lookup,
                "FEED_ORCHESTRATOR_EVENT_CAPACITY",
                DEFAULT_EVENT_CAPACITY,
            ),
            reconnect,
        })
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has an unrecognised value.
    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value)
}

fn parse_opt<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    parse_opt(lookup, key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config =
            OrchestratorConfig::from_lookup(lookup_from(&[("ALPACA_KEY", "k"), ("ALPACA_SECRET", "s")]))
                .unwrap();

        assert_eq!(config.credentials.key(), "k");
        assert_eq!(config.credentials.secret(), "s");
        assert_eq!(config.asset_class, AssetClass::Equity);
        assert_eq!(config.endpoint_override, None);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.reconnect, ReconnectSettings::default());
    }

    #[test]
    fn missing_key_is_reported() {
        let err = OrchestratorConfig::from_lookup(lookup_from(&[("ALPACA_SECRET", "s")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("ALPACA_KEY".to_string()));
    }

    #[test]
    fn empty_secret_is_reported() {
        let err = OrchestratorConfig::from_lookup(lookup_from(&[
            ("ALPACA_KEY", "k"),
            ("ALPACA_SECRET", ""),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::EmptyValue("ALPACA_SECRET".to_string()));
    }

    #[test]
    fn asset_class_and_override_are_read() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("ALPACA_KEY", "k"),
            ("ALPACA_SECRET", "s"),
            ("ALPACA_ASSET_CLASS", "Crypto"),
            ("ALPACA_DATA_STREAM_URL", " wss://proxy.example "),
        ]))
        .unwrap();

        assert_eq!(config.asset_class, AssetClass::Crypto);
        assert_eq!(config.endpoint_override.as_deref(), Some("wss://proxy.example"));
    }

    #[test]
    fn blank_override_means_none() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("ALPACA_KEY", "k"),
            ("ALPACA_SECRET", "s"),
            ("ALPACA_DATA_STREAM_URL", "   "),
        ]))
        .unwrap();
        assert_eq!(config.endpoint_override, None);
    }

    #[test]
    fn unknown_asset_class_is_invalid() {
        let err = OrchestratorConfig::from_lookup(lookup_from(&[
            ("ALPACA_KEY", "k"),
            ("ALPACA_SECRET", "s"),
            ("ALPACA_ASSET_CLASS", "bonds"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ALPACA_ASSET_CLASS"));
    }

    #[test]
    fn numeric_settings_fall_back_on_garbage() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("ALPACA_KEY", "k"),
            ("ALPACA_SECRET", "s"),
            ("FEED_ORCHESTRATOR_EVENT_CAPACITY", "lots"),
            ("FEED_ORCHESTRATOR_RECONNECT_DELAY_INITIAL_MS", "125"),
            ("FEED_ORCHESTRATOR_RECONNECT_DELAY_MAX_SECS", "5"),
            ("FEED_ORCHESTRATOR_MAX_RECONNECT_ATTEMPTS", "7"),
        ]))
        .unwrap();

        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.reconnect.delay_initial, Duration::from_millis(125));
        assert_eq!(config.reconnect.delay_max, Duration::from_secs(5));
        assert_eq!(config.reconnect.max_attempts, 7);
    }

    #[test]
    fn reconnect_delays_are_read_and_garbage_keeps_defaults() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("ALPACA_KEY", "k"),
            ("ALPACA_SECRET", "s"),
            ("FEED_ORCHESTRATOR_RECONNECT_DELAY_INITIAL_MS", " 750 "),
            ("FEED_ORCHESTRATOR_RECONNECT_DELAY_MAX_SECS", "soon"),
            ("FEED_ORCHESTRATOR_RECONNECT_DELAY_MULTIPLIER", "1.5"),
        ]))
        .unwrap();

        assert_eq!(config.reconnect.delay_initial, Duration::from_millis(750));
        assert_eq!(config.reconnect.delay_max, ReconnectSettings::default().delay_max);
        assert!((config.reconnect.delay_multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn builder_sets_override() {
        let config = OrchestratorConfig::new(Credentials::new("k", "s"), AssetClass::Option)
            .with_endpoint_override("wss://proxy.example");
        assert_eq!(config.endpoint_override.as_deref(), Some("wss://proxy.example"));
    }
}
