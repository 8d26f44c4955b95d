//! Feed Fallback Integration Tests
//!
//! Tests environment fallback order, pinning, endpoint overrides and tier
//! failure reporting against scripted streaming clients.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use alpaca_feed_orchestrator::{
    AssetClass, AuthStatus, CandidateEnvironments, ClientEvent, Credentials, Environment,
    MockStreamClientFactory, OrchestratorConfig, OrchestratorError, OrchestratorState, StreamClientError, StreamEvent,
    StreamingClientFactory, StreamingConnectionOrchestrator,
};

fn setup(
    factory: MockStreamClientFactory,
    asset_class: AssetClass,
    endpoint_override: Option<&str>,
) -> (Arc<MockStreamClientFactory>, StreamingConnectionOrchestrator) {
    let factory = Arc::new(factory);
    let orchestrator = StreamingConnectionOrchestrator::new(
        Arc::clone(&factory) as Arc<dyn StreamingClientFactory>,
        Credentials::new("test-key", "test-secret"),
        asset_class,
        endpoint_override.map(str::to_string),
    );
    (factory, orchestrator)
}

fn environment_failures(rx: &mut broadcast::Receiver<StreamEvent>) -> Vec<String> {
    let mut failures = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let StreamEvent::EnvironmentFailure(message) = event {
            failures.push(message);
        }
    }
    failures
}

fn rejecting(environments: &[Environment]) -> MockStreamClientFactory {
    environments
        .iter()
        .fold(MockStreamClientFactory::new(), |factory, env| {
            factory.with_status(*env, AuthStatus::Unauthorized)
        })
}

// =============================================================================
// Fallback Order
// =============================================================================

#[tokio::test]
async fn test_live_failure_falls_back_to_paper_only_once() {
    let (factory, mut orch) = setup(
        rejecting(&[Environment::Live, Environment::Paper]),
        AssetClass::Equity,
        None,
    );

    orch.connect_and_authenticate(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        factory.attempted_environments(),
        vec![Environment::Live, Environment::Paper]
    );
}

#[tokio::test]
async fn test_equity_paper_fallback_scenario() {
    let (factory, mut orch) = setup(rejecting(&[Environment::Live]), AssetClass::Equity, None);
    let mut rx = orch.subscribe();

    let status = orch
        .connect_and_authenticate(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, AuthStatus::Authorized);
    assert_eq!(orch.candidates().as_slice(), &[Environment::Paper]);
    assert_eq!(orch.active_environment(), Some(Environment::Paper));
    assert_eq!(
        factory.attempted_urls(),
        vec![
            "wss://stream.data.alpaca.markets/v2/sip".to_string(),
            "wss://stream.data.alpaca.markets/v2/iex".to_string(),
        ]
    );

    let failures = environment_failures(&mut rx);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("live"));
    assert!(failures[0].contains("paid"));
    assert!(failures[0].contains("SIP"));
}

#[tokio::test]
async fn test_crypto_exhaustion_emits_no_tier_failures() {
    let (factory, mut orch) = setup(
        rejecting(&[Environment::Live, Environment::Paper]),
        AssetClass::Crypto,
        None,
    );
    let mut rx = orch.subscribe();

    let status = orch
        .connect_and_authenticate(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, AuthStatus::Unauthorized);
    assert_eq!(factory.clients().len(), 2);
    assert!(environment_failures(&mut rx).is_empty());
    assert_eq!(orch.state(), OrchestratorState::Exhausted);
    assert!(!orch.is_open_and_authorized());
}

#[tokio::test]
async fn test_index_options_use_option_feeds() {
    let (factory, mut orch) = setup(rejecting(&[Environment::Live]), AssetClass::IndexOption, None);
    let mut rx = orch.subscribe();

    orch.connect_and_authenticate(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        factory.attempted_urls(),
        vec![
            "wss://stream.data.alpaca.markets/v1beta1/opra".to_string(),
            "wss://stream.data.alpaca.markets/v1beta1/indicative".to_string(),
        ]
    );
    let failures = environment_failures(&mut rx);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("OPRA"));
}

// =============================================================================
// Pinning
// =============================================================================

#[tokio::test]
async fn test_pinned_paper_is_the_only_environment_retried() {
    let (factory, mut orch) = setup(rejecting(&[Environment::Live]), AssetClass::Equity, None);
    let cancel = CancellationToken::new();

    orch.connect_and_authenticate(&cancel).await.unwrap();
    assert_eq!(orch.candidates(), &CandidateEnvironments::Pinned(Environment::Paper));

    // Live would authorize now, but it is never tried again.
    factory.set_status(Environment::Live, AuthStatus::Authorized);
    orch.connect_and_authenticate(&cancel).await.unwrap();

    assert_eq!(
        factory.attempted_environments(),
        vec![Environment::Live, Environment::Paper, Environment::Paper]
    );
}

#[tokio::test]
async fn test_pinned_environment_is_not_re_expanded_after_rejection() {
    let (factory, mut orch) = setup(MockStreamClientFactory::new(), AssetClass::Equity, None);
    let cancel = CancellationToken::new();

    orch.connect_and_authenticate(&cancel).await.unwrap();
    factory.set_status(Environment::Live, AuthStatus::Unauthorized);

    let status = orch.connect_and_authenticate(&cancel).await.unwrap();

    assert_eq!(status, AuthStatus::Unauthorized);
    assert_eq!(orch.candidates().as_slice(), &[Environment::Live]);
    assert_eq!(
        factory.attempted_environments(),
        vec![Environment::Live, Environment::Live]
    );
}

#[tokio::test]
async fn test_reconnect_replaces_previous_client() {
    let (factory, mut orch) = setup(MockStreamClientFactory::new(), AssetClass::Equity, None);
    let cancel = CancellationToken::new();

    orch.connect_and_authenticate(&cancel).await.unwrap();
    orch.connect_and_authenticate(&cancel).await.unwrap();

    let clients = factory.clients();
    assert_eq!(clients.len(), 2);
    assert!(clients[0].is_disposed());
    assert_eq!(clients[0].subscriber_count(), 0);
    assert!(!clients[1].is_disposed());
    assert_eq!(clients[1].subscriber_count(), 1);
}

// =============================================================================
// Endpoint Override
// =============================================================================

#[tokio::test]
async fn test_override_connects_once_to_custom_address() {
    let (factory, mut orch) = setup(
        rejecting(&[Environment::Live, Environment::Paper]),
        AssetClass::Equity,
        Some("wss://proxy.example"),
    );
    let mut rx = orch.subscribe();

    let status = orch
        .connect_and_authenticate(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, AuthStatus::Unauthorized);
    assert_eq!(factory.attempted_urls(), vec!["wss://proxy.example".to_string()]);
    assert!(environment_failures(&mut rx).is_empty());
}

#[tokio::test]
async fn test_override_success_uses_custom_address() {
    let (factory, mut orch) = setup(
        MockStreamClientFactory::new(),
        AssetClass::Option,
        Some("wss://proxy.example"),
    );

    let status = orch
        .connect_and_authenticate(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, AuthStatus::Authorized);
    let client = factory.last_client().unwrap();
    assert_eq!(client.config().url, "wss://proxy.example");
    assert_eq!(client.config().asset_class, AssetClass::Option);
    assert_eq!(client.config().credentials.key(), "test-key");
}

#[tokio::test]
async fn test_override_from_config() {
    let factory = Arc::new(MockStreamClientFactory::new());
    let config = OrchestratorConfig::from_lookup(|key| match key {
        "ALPACA_KEY" => Some("k".to_string()),
        "ALPACA_SECRET" => Some("s".to_string()),
        "ALPACA_ASSET_CLASS" => Some("crypto".to_string()),
        "ALPACA_DATA_STREAM_URL" => Some("wss://proxy.example".to_string()),
        _ => None,
    })
    .unwrap();
    let mut orch = StreamingConnectionOrchestrator::from_config(
        Arc::clone(&factory) as Arc<dyn StreamingClientFactory>,
        &config,
    );

    orch.connect_and_authenticate(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(factory.attempted_urls(), vec!["wss://proxy.example".to_string()]);
    assert_eq!(orch.asset_class(), AssetClass::Crypto);
}

// =============================================================================
// Unsupported Paths
// =============================================================================

#[tokio::test]
async fn test_unsupported_asset_class_is_fatal() {
    for asset_class in [AssetClass::Forex, AssetClass::Future] {
        for endpoint_override in [None, Some("wss://proxy.example")] {
            let (factory, mut orch) =
                setup(MockStreamClientFactory::new(), asset_class, endpoint_override);

            let err = orch
                .connect_and_authenticate(&CancellationToken::new())
                .await
                .unwrap_err();

            assert_eq!(err, OrchestratorError::UnsupportedAssetClass(asset_class));
            assert!(factory.clients().is_empty());
        }
    }
}

#[tokio::test]
async fn test_factory_error_on_fallback_candidate_releases_rejected_client() {
    let (factory, mut orch) = setup(
        MockStreamClientFactory::new()
            .with_status(Environment::Live, AuthStatus::Unauthorized)
            .with_factory_error(
                Environment::Paper,
                StreamClientError::InvalidConfiguration("paper feed missing".to_string()),
            ),
        AssetClass::Equity,
        None,
    );

    let err = orch
        .connect_and_authenticate(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        OrchestratorError::Client(StreamClientError::InvalidConfiguration(
            "paper feed missing".to_string()
        ))
    );
    let clients = factory.clients();
    assert_eq!(clients.len(), 1);
    assert!(clients[0].is_disposed());
    assert_eq!(clients[0].subscriber_count(), 0);
    assert_eq!(orch.active_environment(), None);
    assert_eq!(orch.state(), OrchestratorState::Failed(Environment::Paper));
    assert!(!orch.is_open_and_authorized());
}

#[tokio::test]
async fn test_factory_error_on_reconnect_releases_previous_client() {
    let (factory, mut orch) = setup(MockStreamClientFactory::new(), AssetClass::Equity, None);
    let cancel = CancellationToken::new();

    orch.connect_and_authenticate(&cancel).await.unwrap();
    assert_eq!(orch.state(), OrchestratorState::Authorized(Environment::Live));

    factory.set_factory_error(
        Environment::Live,
        StreamClientError::InvalidConfiguration("credentials revoked".to_string()),
    );
    let err = orch.connect_and_authenticate(&cancel).await.unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Client(StreamClientError::InvalidConfiguration(_))
    ));
    let clients = factory.clients();
    assert_eq!(clients.len(), 1);
    assert!(clients[0].is_disposed());
    assert_eq!(clients[0].subscriber_count(), 0);
    assert_eq!(orch.active_environment(), None);
    assert_eq!(orch.state(), OrchestratorState::Failed(Environment::Live));

    // The released client can no longer move the status.
    let before = orch.is_open_and_authorized();
    clients[0].emit(ClientEvent::SocketClosed);
    assert_eq!(orch.is_open_and_authorized(), before);
}

#[tokio::test]
async fn test_connect_without_auth_always_fails() {
    let (_factory, mut orch) = setup(MockStreamClientFactory::new(), AssetClass::Equity, None);
    let cancel = CancellationToken::new();

    assert!(matches!(
        orch.connect(&cancel).await,
        Err(OrchestratorError::Unsupported(_))
    ));

    orch.connect_and_authenticate(&cancel).await.unwrap();
    assert!(matches!(
        orch.connect(&cancel).await,
        Err(OrchestratorError::Unsupported(_))
    ));

    orch.disconnect(&cancel).await.unwrap();
    assert!(matches!(
        orch.connect(&cancel).await,
        Err(OrchestratorError::Unsupported(_))
    ));
}
