//! Alpaca Stream Endpoints
//!
//! Default market data stream addresses per asset family and environment,
//! and the backoff policy used when a caller keeps a session alive.

pub mod endpoints;
pub mod reconnect;

pub use endpoints::{DATA_STREAM_HOST, default_endpoint_config, default_stream_url};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
