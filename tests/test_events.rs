use serial_test::serial;
use simple_storage_sdk::client::Error;
use simple_storage_sdk::events::QueryError;
use simple_storage_sdk::{EventsQuery, U256};
use simple_storage_test_utils::{MockNode, get_client, init_logger};

#[tokio::test]
#[serial]
async fn test_events_are_paginated_in_block_order() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    let mut hashes = Vec::new();
    for (block, value) in [(1_010u64, 3u64), (1_001, 1), (1_005, 2), (1_020, 4), (1_030, 5)] {
        hashes.push((block, node.emit_value_updated(block, U256::from(value)).await));
    }
    hashes.sort_by_key(|(block, _)| *block);

    let query = EventsQuery::new(1_000, 1_100).with_limit(2);
    let first = client.get_events_page(query).await?;
    assert_eq!(first.meta.total, 5);
    assert_eq!(first.meta.total_pages, 3);
    assert!(first.meta.has_next_page);
    assert!(!first.meta.has_prev_page);
    assert_eq!(
        first.data.iter().map(|e| e.block_number).collect::<Vec<_>>(),
        vec![1_001, 1_005]
    );
    assert_eq!(first.data[0].value, U256::from(1));
    assert_eq!(first.data[0].tx_hash, hashes[0].1);

    let last = client.get_events_page(query.with_page(3)).await?;
    assert_eq!(last.data.len(), 1);
    assert_eq!(last.data[0].value, U256::from(5));
    assert!(!last.meta.has_next_page);
    assert!(last.meta.has_prev_page);

    let past_end = client.get_events_page(query.with_page(9)).await?;
    assert!(past_end.data.is_empty());
    assert_eq!(past_end.meta.total, 5);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_events_outside_range_are_excluded() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    node.emit_value_updated(99, U256::from(1)).await;
    node.emit_value_updated(100, U256::from(2)).await;
    node.emit_value_updated(200, U256::from(3)).await;
    node.emit_value_updated(201, U256::from(4)).await;

    let events = client.get_value_updated_events(100, 200).await?;
    let values: Vec<_> = events.iter().map(|e| e.value).collect();
    assert_eq!(values, vec![U256::from(2), U256::from(3)]);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_block_range_guard_skips_node() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    match client.get_events_page(EventsQuery::new(0, 2048)).await {
        Err(Error::InvalidQuery(QueryError::BlockRangeTooLarge { range })) => {
            assert_eq!(range, 2048)
        }
        other => panic!("expected a block range error, got {other:?}"),
    }
    match client.get_events_page(EventsQuery::new(10, 5)).await {
        Err(Error::InvalidQuery(QueryError::InvertedBlockRange { .. })) => {}
        other => panic!("expected an inverted range error, got {other:?}"),
    }
    assert_eq!(node.controller().call_count("eth_getLogs"), 0);

    // The widest accepted range reaches the node.
    let page = client.get_events_page(EventsQuery::new(0, 2047)).await?;
    assert_eq!(page.meta.total, 0);
    assert_eq!(node.controller().call_count("eth_getLogs"), 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_page_and_limit_validated_after_range() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    let bad_page = EventsQuery::new(0, 10).with_page(0);
    assert!(matches!(
        client.get_events_page(bad_page).await,
        Err(Error::InvalidQuery(QueryError::InvalidPage))
    ));

    let bad_limit = EventsQuery::new(0, 10).with_limit(101);
    assert!(matches!(
        client.get_events_page(bad_limit).await,
        Err(Error::InvalidQuery(QueryError::InvalidLimit))
    ));

    let both_bad = EventsQuery::new(0, 5000).with_page(0).with_limit(0);
    assert!(matches!(
        client.get_events_page(both_bad).await,
        Err(Error::InvalidQuery(QueryError::BlockRangeTooLarge { .. }))
    ));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_default_events_query_looks_back_from_head() -> anyhow::Result<()> {
    init_logger(false);
    let node = MockNode::start().await?;
    let client = get_client(&node);

    node.set_head_block(1_000).await;
    assert_eq!(
        client.default_events_query(100).await?,
        EventsQuery::new(900, 1_000)
    );

    node.set_head_block(40).await;
    assert_eq!(client.default_events_query(100).await?, EventsQuery::new(0, 40));
    Ok(())
}
