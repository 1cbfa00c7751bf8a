// # SimpleStorage SDK
//!
//! Rust access to the tutorial `SimpleStorage` contract deployed on the
//! [Avalanche Fuji](https://docs.avax.network/) test network. The contract holds a single
//! `uint256` and emits `ValueUpdated(uint256 newValue)` whenever it changes.
//!
//! The SDK is shared by the two binaries of this workspace:
//! - `simple-storage-api`, an HTTP service proxying contract reads and paginating
//!   historical `ValueUpdated` events;
//! - `simple-storage-cli`, a command line wallet for reading, writing and listing events.
//!
//! For writing you need a funded Fuji key. By default it is read from `private.key` in
//! the standard config folder as per the [XDG specification](https://specifications.freedesktop.org/basedir-spec/latest/):
//! - `~/.config/simple-storage/` on **Linux**
//! - `~/Library/Application Support/simple-storage/` on **macOS**
//! - `%APPDATA%\simple-storage\` on **Windows**
//!
//! # Reading events
//!
//! The RPC node answers log queries for at most 2047 blocks at a time, so
//! [`SimpleStorageClient::get_events_page`] rejects wider ranges before calling it and
//! pages the matching events in memory. RPC failures can be translated into
//! user-facing outcomes with [`rpc::Error::failure`].

/// Re-export commonly used types from `alloy`.
pub use alloy::primitives::{Address, B256, U256};
pub use alloy::signers::local::PrivateKeySigner;
pub use alloy::transports::http::reqwest::Url;

pub use client::SimpleStorageClient;
pub use events::{EventsQuery, Page, PageMeta, ValueUpdatedEvent};
pub use rpc::RpcFailure;

/// Module for the contract ABI and Fuji deployment constants.
pub mod eth;

/// Module for JSON-RPC error types and their translation into user-facing outcomes.
pub mod rpc;

/// Module for the contract client.
pub mod client;

/// Module for `ValueUpdated` events: block-range guard, decoding and pagination.
pub mod events;

/// Module for a provider wrapper that retries transient failures and bounds request time.
pub mod resilient_provider;

/// Module for loading wallet keys.
pub mod signers;

/// Module for `setValue` transaction status tracking.
pub mod transaction;

/// Module for wallet connection status.
pub mod wallet;

/// Module with formatting and conversion helpers.
pub mod utils;
