use bigdecimal::BigDecimal;
use serial_test::serial;
use simple_storage_sdk::U256;
use simple_storage_sdk::client::Error;
use simple_storage_sdk::transaction::{TxStatus, WRONG_NETWORK_MESSAGE};
use simple_storage_sdk::wallet::NetworkStatus;
use simple_storage_test_utils::mock::{CallOverride, CallResponse};
use simple_storage_test_utils::{MockNode, get_client, get_wallet_client, init_logger};
use std::str::FromStr;

const ONE_AVAX: u128 = 1_000_000_000_000_000_000;

#[tokio::test]
#[serial]
async fn test_wallet_status_on_fuji() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let (client, wallet) = get_wallet_client(&node, ONE_AVAX + ONE_AVAX / 4).await?;

    let status = client.wallet_status().await?;
    assert_eq!(status.address, wallet.address());
    assert_eq!(status.network, NetworkStatus::Expected);
    assert_eq!(status.network_name(), "Avalanche Fuji Testnet");
    assert_eq!(status.status_message(), "Connected");
    assert_eq!(status.balance, Some(U256::from(ONE_AVAX + ONE_AVAX / 4)));
    assert_eq!(status.display_balance(), "1.2500");

    let balance = client.get_balance(wallet.address()).await?;
    assert_eq!(balance, BigDecimal::from_str("1.25")?);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_wallet_status_on_wrong_network() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start_with_chain_id(1).await?;
    let (client, _wallet) = get_wallet_client(&node, ONE_AVAX).await?;

    let status = client.wallet_status().await?;
    assert_eq!(status.network, NetworkStatus::Wrong(1));
    assert_eq!(status.network_name(), "Wrong Network");
    assert_eq!(status.balance, None);
    assert_eq!(status.display_balance(), "-");
    assert_eq!(node.controller().call_count("eth_getBalance"), 0);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_set_value_refused_on_wrong_network() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let (client, _wallet) = get_wallet_client(&node, ONE_AVAX).await?;
    node.set_chain_id(1).await;

    let mut statuses = Vec::new();
    let result = client
        .set_value_with_status(U256::from(5), |status| statuses.push(status.clone()))
        .await;

    assert!(matches!(
        result,
        Err(Error::WrongNetwork {
            expected: 43113,
            actual: 1
        })
    ));
    assert_eq!(
        statuses,
        vec![TxStatus::Failed(WRONG_NETWORK_MESSAGE.to_string())]
    );
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_read_only_client_has_no_wallet() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    assert!(client.owner_address().is_none());
    assert!(matches!(client.wallet_status().await, Err(Error::NoWallet)));
    assert!(matches!(
        client.set_value(U256::from(1)).await,
        Err(Error::NoWallet)
    ));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_wallet_error_codes_are_described() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let (client, _wallet) = get_wallet_client(&node, ONE_AVAX).await?;

    node.controller().override_rpc(
        "eth_chainId",
        CallOverride::Once(CallResponse::ErrorWithCode {
            code: -32002,
            message: "Request of type 'wallet_requestPermissions' already pending".to_string(),
        }),
    );
    let err = client.wallet_status().await.unwrap_err();
    assert_eq!(
        err.wallet_message(),
        "A connection request is already pending. Check your wallet."
    );

    node.controller().override_rpc(
        "eth_chainId",
        CallOverride::Once(CallResponse::ErrorWithCode {
            code: 4001,
            message: "User rejected the request.".to_string(),
        }),
    );
    let err = client.wallet_status().await.unwrap_err();
    assert_eq!(err.wallet_message(), "Connection rejected by user.");

    node.controller().override_rpc(
        "eth_chainId",
        CallOverride::Once(CallResponse::Error("internal error".to_string())),
    );
    let err = client.wallet_status().await.unwrap_err();
    assert!(
        err.wallet_message().starts_with("An error occurred: "),
        "{}",
        err.wallet_message()
    );
    Ok(())
}
