use alloy::primitives::{B256, U256};
use alloy::rpc::types::Log;
use alloy_sol_types::SolEvent;
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use thiserror::Error;

use crate::eth::SimpleStorage;
use crate::rpc;
use crate::utils::serialize_display;

/// Upper bound (exclusive) on `toBlock - fromBlock` accepted by the RPC node's log query.
pub const MAX_BLOCK_RANGE: u64 = 2048;

/// Largest accepted page size.
pub const MAX_PAGE_LIMIT: u32 = 100;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// How many blocks back from the chain head an events query looks when no range is given.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 100;

/// Reasons an events query is rejected before reaching the node.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Block range too large ({range} blocks). At most 2047 blocks per request.
    BlockRangeTooLarge { range: u64 },
    /// fromBlock ({from_block}) must not be greater than toBlock ({to_block}).
    InvertedBlockRange { from_block: u64, to_block: u64 },
    /// Page must be >= 1.
    InvalidPage,
    /// Limit must be between 1 and 100.
    InvalidLimit,
}

/// Checks that the inclusive range `[from_block, to_block]` can be queried in one request.
pub fn check_block_range(from_block: u64, to_block: u64) -> Result<(), QueryError> {
    if from_block > to_block {
        return Err(QueryError::InvertedBlockRange {
            from_block,
            to_block,
        });
    }
    let range = to_block - from_block;
    if range >= MAX_BLOCK_RANGE {
        return Err(QueryError::BlockRangeTooLarge { range });
    }
    Ok(())
}

/// A paginated request for `ValueUpdated` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub from_block: u64,
    pub to_block: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl EventsQuery {
    /// Query for the first page of the given range with the default page size.
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Set the 1-based page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Validates the block range first, then the page, then the limit.
    pub fn validate(&self) -> Result<(), QueryError> {
        check_block_range(self.from_block, self.to_block)?;
        if self.page < 1 {
            return Err(QueryError::InvalidPage);
        }
        if self.limit < 1 || self.limit > MAX_PAGE_LIMIT {
            return Err(QueryError::InvalidLimit);
        }
        Ok(())
    }
}

/// A `ValueUpdated` event as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueUpdatedEvent {
    /// The block number where the event occurred
    #[serde(serialize_with = "serialize_display")]
    pub block_number: u64,
    /// The new stored value
    #[serde(serialize_with = "serialize_display")]
    pub value: U256,
    /// The transaction hash that triggered the event
    pub tx_hash: B256,
}

impl TryFrom<Log> for ValueUpdatedEvent {
    type Error = rpc::Error;

    /// Attempts to parse a blockchain log into a `ValueUpdatedEvent`.
    /// Returns an error if required fields are missing or the log is not a `ValueUpdated` event.
    fn try_from(log: Log) -> Result<Self, Self::Error> {
        let block_number = log
            .block_number
            .ok_or_else(|| rpc::Error::DecodeError("Missing block number".to_string()))?;
        let tx_hash = log
            .transaction_hash
            .ok_or_else(|| rpc::Error::DecodeError("Missing transaction hash".to_string()))?;
        let decoded = SimpleStorage::ValueUpdated::decode_log(&log.inner)
            .map_err(|e| rpc::Error::DecodeError(format!("Invalid ValueUpdated log: {e}")))?;
        Ok(Self {
            block_number,
            value: decoded.data.newValue,
            tx_hash,
        })
    }
}

/// Offset pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// One page of results together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Slices `items` into the 1-based `page` of size `limit`, keeping their order.
/// A page past the end is empty but still reports the totals.
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Page<T> {
    let total = items.len();
    let page_size = limit as usize;
    let total_pages = if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    };
    let start = (page.saturating_sub(1) as usize).saturating_mul(page_size);
    let data = items.into_iter().skip(start).take(page_size).collect();

    Page {
        data,
        meta: PageMeta {
            total,
            page,
            limit,
            total_pages,
            has_next_page: (page as usize) < total_pages,
            has_prev_page: page > 1,
        },
    }
}
