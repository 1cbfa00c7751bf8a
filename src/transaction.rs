use alloy::primitives::B256;

use crate::wallet::USER_REJECTED_REQUEST;

/// Shown when the receipt reports a failed execution.
pub const REVERTED_MESSAGE: &str = "Transaction reverted! Please check contract state and try again";

/// Shown when a write is attempted from the wrong chain.
pub const WRONG_NETWORK_MESSAGE: &str = "Wrong network! Please switch to Avalanche Fuji Testnet";

const ERROR_EXCERPT_LEN: usize = 50;

/// Lifecycle of a `setValue` transaction as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// The transaction is built and waiting to be signed and sent.
    AwaitingSignature,
    /// Sent; waiting for it to be mined.
    Confirming(B256),
    /// Mined successfully.
    Confirmed(B256),
    /// Rejected, failed to send or reverted.
    Failed(String),
}

impl TxStatus {
    pub fn message(&self) -> String {
        match self {
            TxStatus::AwaitingSignature => {
                "Transaction pending... Please confirm in wallet".to_string()
            }
            TxStatus::Confirming(_) => "Waiting for confirmation on blockchain...".to_string(),
            TxStatus::Confirmed(_) => {
                "Transaction confirmed! Value updated successfully".to_string()
            }
            TxStatus::Failed(message) => message.clone(),
        }
    }

    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            TxStatus::Confirming(hash) | TxStatus::Confirmed(hash) => Some(*hash),
            _ => None,
        }
    }
}

/// Maps an error raised while sending a write to the message shown to the user.
/// `code` is the JSON-RPC error code of the failure, when there is one.
pub fn describe_write_error(code: Option<i64>, message: &str) -> String {
    let lower = message.to_lowercase();
    if code == Some(USER_REJECTED_REQUEST)
        || lower.contains("user rejected")
        || lower.contains("user denied")
    {
        "Transaction rejected by user".to_string()
    } else if lower.contains("chain") {
        "Wrong network! Please switch to Avalanche Fuji".to_string()
    } else {
        let excerpt: String = message.chars().take(ERROR_EXCERPT_LEN).collect();
        format!("Transaction failed: {excerpt}...")
    }
}
