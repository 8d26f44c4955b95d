//! Default Stream URLs
//!
//! Market data streams are served from the production host for both
//! environments; the environment only selects the feed tier.
//!
//! | Family | Live | Paper |
//! |---|---|---|
//! | Equity | `/v2/sip` | `/v2/iex` |
//! | Option | `/v1beta1/opra` | `/v1beta1/indicative` |
//! | Crypto | `/v1beta3/crypto/us` | `/v1beta3/crypto/us` |

use crate::application::ports::{EndpointConfig, StreamClientError};
use crate::domain::endpoint::{AssetClass, AssetFamily, Credentials, DataFeed, Environment};

/// Market data stream host.
pub const DATA_STREAM_HOST: &str = "wss://stream.data.alpaca.markets";

/// Default stream URL for a family in an environment.
#[must_use]
pub fn default_stream_url(family: AssetFamily, environment: Environment) -> String {
    match family.data_feed(environment) {
        feed @ (DataFeed::Sip | DataFeed::Iex) => {
            format!("{DATA_STREAM_HOST}/v2/{}", feed.as_str())
        }
        feed @ (DataFeed::Opra | DataFeed::Indicative) => {
            format!("{DATA_STREAM_HOST}/v1beta1/{}", feed.as_str())
        }
        DataFeed::Crypto => format!("{DATA_STREAM_HOST}/v1beta3/crypto/us"),
    }
}

/// Default endpoint configuration for an asset class in an environment.
///
/// # Errors
///
/// Returns `StreamClientError::InvalidConfiguration` if the asset class has
/// no streaming family.
pub fn default_endpoint_config(
    asset_class: AssetClass,
    environment: Environment,
    credentials: &Credentials,
) -> Result<EndpointConfig, StreamClientError> {
    let family = asset_class.family().ok_or_else(|| {
        StreamClientError::InvalidConfiguration(format!(
            "no market data stream for asset class {asset_class}"
        ))
    })?;

    Ok(EndpointConfig::new(
        asset_class,
        environment,
        default_stream_url(family, environment),
        credentials.clone(),
    ))
}
