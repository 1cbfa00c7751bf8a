use alloy::primitives::{Address, U256};

use crate::eth::{AVALANCHE_FUJI_CHAIN_ID, AVALANCHE_FUJI_NAME};
use crate::utils::{format_balance, shorten_address};

/// JSON-RPC error code returned when the user rejects a wallet request (EIP-1193).
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// JSON-RPC error code returned while an earlier wallet request is still pending.
pub const REQUEST_ALREADY_PENDING: i64 = -32002;

/// Number of fractional digits shown for native balances.
pub const BALANCE_DISPLAY_DECIMALS: u32 = 4;

/// Whether the wallet is connected to the network the contract lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Expected,
    Wrong(u64),
}

/// Snapshot of a connected wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletStatus {
    pub address: Address,
    pub chain_id: u64,
    pub network: NetworkStatus,
    /// Balance in wei. Only fetched on the expected network.
    pub balance: Option<U256>,
}

impl WalletStatus {
    /// Builds the status for `address` connected to `chain_id`.
    pub fn new(address: Address, chain_id: u64, expected_chain_id: u64) -> Self {
        let network = if chain_id == expected_chain_id {
            NetworkStatus::Expected
        } else {
            NetworkStatus::Wrong(chain_id)
        };
        Self {
            address,
            chain_id,
            network,
            balance: None,
        }
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn is_on_expected_network(&self) -> bool {
        self.network == NetworkStatus::Expected
    }

    pub fn short_address(&self) -> String {
        shorten_address(&self.address)
    }

    pub fn network_name(&self) -> String {
        match self.network {
            NetworkStatus::Expected if self.chain_id == AVALANCHE_FUJI_CHAIN_ID => {
                AVALANCHE_FUJI_NAME.to_string()
            }
            NetworkStatus::Expected => format!("Chain {}", self.chain_id),
            NetworkStatus::Wrong(_) => "Wrong Network".to_string(),
        }
    }

    pub fn status_message(&self) -> &'static str {
        match self.network {
            NetworkStatus::Expected => "Connected",
            NetworkStatus::Wrong(_) => "Wrong network. Please switch to Avalanche Fuji Testnet.",
        }
    }

    /// Balance rendered with four decimals, or `-` when unknown.
    pub fn display_balance(&self) -> String {
        self.balance
            .map(|wei| format_balance(wei, BALANCE_DISPLAY_DECIMALS))
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Maps a wallet JSON-RPC error to the message shown to the user.
pub fn describe_wallet_error(code: Option<i64>, message: &str) -> String {
    match code {
        Some(USER_REJECTED_REQUEST) => "Connection rejected by user.".to_string(),
        Some(REQUEST_ALREADY_PENDING) => {
            "A connection request is already pending. Check your wallet.".to_string()
        }
        _ if message.is_empty() => "An error occurred: failed to connect to wallet".to_string(),
        _ => format!("An error occurred: {message}"),
    }
}
