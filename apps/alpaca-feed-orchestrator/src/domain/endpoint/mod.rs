//! Endpoint Selection Types
//!
//! Environments, feed tiers, asset classes and the candidate list the
//! orchestrator walks when it looks for an entitled data feed.
//!
//! # Fallback Order
//!
//! Candidates start premium-first: `Live` (paid tier) then `Paper` (free
//! tier). Once an environment authenticates the list collapses to that single
//! environment so later reconnects go straight to it.

use std::fmt;

// =============================================================================
// Environment
// =============================================================================

/// Deployment target used as a proxy selector for the feed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Live environment (paid data subscription).
    #[default]
    Live,
    /// Paper environment (free data subscription).
    Paper,
}

impl Environment {
    /// Feed tier this environment stands in for.
    #[must_use]
    pub const fn tier(&self) -> FeedTier {
        match self {
            Self::Live => FeedTier::Paid,
            Self::Paper => FeedTier::Free,
        }
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Paper => "paper",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-quality level tied to an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedTier {
    /// Premium subscription.
    Paid,
    /// Free subscription.
    Free,
}

impl FeedTier {
    /// Label used in diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Free => "free",
        }
    }
}

impl fmt::Display for FeedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Asset Class
// =============================================================================

/// Asset class the orchestrator streams.
///
/// Only three families have streaming endpoints; see [`AssetClass::family`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssetClass {
    /// US equities.
    #[default]
    Equity,
    /// Crypto pairs.
    Crypto,
    /// Equity options.
    Option,
    /// Index options.
    IndexOption,
    /// Foreign exchange.
    Forex,
    /// Futures.
    Future,
}

impl AssetClass {
    /// Parse asset class from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "equity" | "us_equity" | "stock" => Some(Self::Equity),
            "crypto" => Some(Self::Crypto),
            "option" | "us_option" => Some(Self::Option),
            "index_option" | "indexoption" => Some(Self::IndexOption),
            "forex" => Some(Self::Forex),
            "future" => Some(Self::Future),
            _ => None,
        }
    }

    /// Resolve the streaming family, or `None` when no stream exists.
    #[must_use]
    pub const fn family(&self) -> Option<AssetFamily> {
        match self {
            Self::Equity => Some(AssetFamily::Equity),
            Self::Crypto => Some(AssetFamily::Crypto),
            Self::Option | Self::IndexOption => Some(AssetFamily::Option),
            Self::Forex | Self::Future => None,
        }
    }

    /// Get the asset class name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Crypto => "crypto",
            Self::Option => "option",
            Self::IndexOption => "index_option",
            Self::Forex => "forex",
            Self::Future => "future",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Streaming family an asset class resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFamily {
    /// Stock stream.
    Equity,
    /// Crypto stream.
    Crypto,
    /// Options stream.
    Option,
}

impl AssetFamily {
    /// Named data feed served for this family in `environment`.
    #[must_use]
    pub const fn data_feed(&self, environment: Environment) -> DataFeed {
        match (self, environment) {
            (Self::Equity, Environment::Live) => DataFeed::Sip,
            (Self::Equity, Environment::Paper) => DataFeed::Iex,
            (Self::Option, Environment::Live) => DataFeed::Opra,
            (Self::Option, Environment::Paper) => DataFeed::Indicative,
            (Self::Crypto, _) => DataFeed::Crypto,
        }
    }

    /// Whether the feed differs between environments.
    ///
    /// Crypto is served from one feed, so a failed crypto attempt says
    /// nothing about entitlement.
    #[must_use]
    pub const fn has_tiered_feeds(&self) -> bool {
        !matches!(self, Self::Crypto)
    }
}

/// Market data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFeed {
    /// SIP (Securities Information Processor) - Full market data.
    Sip,
    /// IEX (Investors Exchange) - Free tier with limited data.
    Iex,
    /// OPRA - Full options data.
    Opra,
    /// Indicative options pricing - Free tier.
    Indicative,
    /// Crypto market data.
    Crypto,
}

impl DataFeed {
    /// Get the feed name used in stream URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::Iex => "iex",
            Self::Opra => "opra",
            Self::Indicative => "indicative",
            Self::Crypto => "crypto",
        }
    }

    /// Human-readable feed name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Sip => "SIP",
            Self::Iex => "IEX",
            Self::Opra => "OPRA",
            Self::Indicative => "Indicative",
            Self::Crypto => "Crypto",
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Alpaca API credentials.
///
/// Opaque to the orchestrator; handed unchanged to every endpoint
/// configuration. The `Debug` implementation redacts the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Get the API key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the API secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials(key={})", self.key)
    }
}

// =============================================================================
// Candidate Environments
// =============================================================================

const FALLBACK_ORDER: [Environment; 2] = [Environment::Live, Environment::Paper];

/// Ordered environments to attempt on the next connect.
///
/// Acts as a one-entry cache of the last environment that worked. Never
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateEnvironments {
    /// Premium first, then free: `[Live, Paper]`.
    #[default]
    Fallback,
    /// Collapsed to a single environment.
    Pinned(Environment),
}

impl CandidateEnvironments {
    /// Environments in attempt order.
    #[must_use]
    pub fn as_slice(&self) -> &[Environment] {
        match self {
            Self::Fallback => &FALLBACK_ORDER,
            Self::Pinned(env) => std::slice::from_ref(env),
        }
    }

    /// Collapse to `environment`.
    pub const fn pin(&mut self, environment: Environment) {
        *self = Self::Pinned(environment);
    }

    /// The pinned environment, if collapsed.
    #[must_use]
    pub const fn pinned(&self) -> Option<Environment> {
        match self {
            Self::Fallback => None,
            Self::Pinned(env) => Some(*env),
        }
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}
