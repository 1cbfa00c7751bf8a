use serial_test::serial;
use simple_storage_sdk::U256;
use simple_storage_sdk::client::Error;
use simple_storage_test_utils::mock::{CallOverride, CallResponse};
use simple_storage_test_utils::{MockNode, TEST_CHAIN_ID, TEST_HEAD_BLOCK, get_client, init_logger};

#[tokio::test]
#[serial]
async fn test_get_value() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    assert_eq!(client.get_value().await?, U256::ZERO);

    node.set_value(U256::from(42)).await;
    assert_eq!(client.get_value().await?, U256::from(42));

    node.emit_value_updated(TEST_HEAD_BLOCK + 1, U256::MAX).await;
    assert_eq!(client.get_value().await?, U256::MAX);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_chain_id_and_block_number() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    assert_eq!(client.get_chain_id().await?, TEST_CHAIN_ID);
    assert_eq!(client.get_current_block_number().await?, TEST_HEAD_BLOCK);

    node.set_head_block(12_345).await;
    assert_eq!(client.get_current_block_number().await?, 12_345);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_get_value_reverted_call_is_internal() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    node.controller().override_rpc(
        "eth_call",
        CallOverride::Once(CallResponse::Error("execution reverted".to_string())),
    );

    match client.get_value().await {
        Err(Error::Rpc(e)) => {
            assert_eq!(e.failure(), simple_storage_sdk::RpcFailure::Internal)
        }
        other => panic!("expected an RPC error, got {other:?}"),
    }
    // The override is used up.
    assert_eq!(client.get_value().await?, U256::ZERO);
    Ok(())
}
