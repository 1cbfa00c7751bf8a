use anyhow::Result;
use simple_storage_sdk::eth::AVALANCHE_FUJI_CHAIN_ID;
use simple_storage_sdk::resilient_provider::ResilientProviderConfig;
use simple_storage_sdk::{PrivateKeySigner, SimpleStorageClient};
use std::time::Duration;

pub mod mock;

pub use mock::MockNode;

/// Chain id the mock node reports by default.
pub const TEST_CHAIN_ID: u64 = AVALANCHE_FUJI_CHAIN_ID;

/// Block height the mock node starts at.
pub const TEST_HEAD_BLOCK: u64 = 5_000;

/// Initializes `env_logger` for tests. Safe to call from every test.
pub fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .is_test(true)
        .try_init();
}

/// Retry settings short enough for tests.
pub fn test_provider_config() -> ResilientProviderConfig {
    ResilientProviderConfig {
        retry_delay_ms: 10,
        backend_health_timeout_secs: 1,
        ..Default::default()
    }
    .with_request_timeout(Duration::from_millis(500))
    .with_receipt_wait(Duration::from_millis(300), Duration::from_millis(20))
}

/// Read-only client talking to the mock node.
pub fn get_client(node: &MockNode) -> SimpleStorageClient {
    SimpleStorageClient::builder()
        .rpc_url(node.url().clone())
        .contract_address(node.contract_address())
        .provider_config(test_provider_config())
        .build()
}

/// Client with a freshly generated wallet funded on the mock node.
pub async fn get_wallet_client(
    node: &MockNode,
    balance_wei: u128,
) -> Result<(SimpleStorageClient, PrivateKeySigner)> {
    let wallet = PrivateKeySigner::random();
    node.set_balance(wallet.address(), balance_wei).await;
    let client = SimpleStorageClient::builder()
        .rpc_url(node.url().clone())
        .contract_address(node.contract_address())
        .wallet(wallet.clone())
        .provider_config(test_provider_config())
        .build();
    Ok((client, wallet))
}
