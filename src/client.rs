use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use bigdecimal::BigDecimal;
use bon::bon;
use displaydoc::Display;
use thiserror::Error;

use crate::eth::{self, AVALANCHE_FUJI_CHAIN_ID, DEFAULT_CONTRACT_ADDRESS};
use crate::events::{self, EventsQuery, Page, QueryError, ValueUpdatedEvent};
use crate::resilient_provider::{ResilientProvider, ResilientProviderConfig};
use crate::rpc;
use crate::transaction::{REVERTED_MESSAGE, TxStatus, WRONG_NETWORK_MESSAGE, describe_write_error};
use crate::utils::wei_to_eth;
use crate::wallet::{WalletStatus, describe_wallet_error};

/// Represents errors returned by [`SimpleStorageClient`].
#[derive(Debug, Display, Error)]
pub enum Error {
    /// {0}
    InvalidQuery(#[from] QueryError),
    /// {0}
    Rpc(#[from] rpc::Error),
    /// No wallet configured; sending transactions requires a private key
    NoWallet,
    /// Connected to chain {actual}, expected chain {expected}
    WrongNetwork { expected: u64, actual: u64 },
    /// {0}
    TransactionFailed(String),
    /// Transaction {0} reverted
    TransactionReverted(B256),
}

impl Error {
    /// Message shown when a wallet request fails, picked by the JSON-RPC error code
    /// the wallet or node answered with.
    pub fn wallet_message(&self) -> String {
        let code = match self {
            Error::Rpc(e) => e.code(),
            _ => None,
        };
        describe_wallet_error(code, &self.to_string())
    }
}

/// User-facing message for a failed write, preferring the node's own error text.
fn write_error_message(err: &anyhow::Error) -> String {
    match rpc::error_payload(err) {
        Some(payload) => describe_write_error(Some(payload.code), &payload.message),
        None => describe_write_error(None, &err.to_string()),
    }
}

/// A client for the `SimpleStorage` contract.
/// Reads the stored value, pages through its `ValueUpdated` events and, when a wallet
/// is configured, writes new values.
#[derive(Clone)]
pub struct SimpleStorageClient {
    /// Provider used for reads.
    provider: ResilientProvider,
    /// Wallet-backed provider used for writes.
    signer_provider: Option<ResilientProvider>,
    /// Wallet used to sign transactions.
    wallet: Option<PrivateKeySigner>,
    /// The URL of the RPC node.
    rpc_url: Url,
    /// Address of the deployed contract.
    contract_address: Address,
    /// Chain the contract is deployed on.
    expected_chain_id: u64,
}

#[bon]
impl SimpleStorageClient {
    /// Creates a client for the contract at `contract_address` reachable through `rpc_url`.
    /// Without a wallet the client is read-only.
    #[builder]
    pub fn new(
        rpc_url: Url,
        #[builder(default = DEFAULT_CONTRACT_ADDRESS)] contract_address: Address,
        wallet: Option<PrivateKeySigner>,
        #[builder(default = AVALANCHE_FUJI_CHAIN_ID)] expected_chain_id: u64,
        #[builder(default)] provider_config: ResilientProviderConfig,
    ) -> Self {
        let provider = ResilientProvider::new(
            ProviderBuilder::new()
                .connect_http(rpc_url.clone())
                .erased(),
            provider_config.clone(),
        );

        let signer_provider = wallet.as_ref().map(|wallet| {
            ResilientProvider::new(
                ProviderBuilder::new()
                    .wallet(wallet.clone())
                    .connect_http(rpc_url.clone())
                    .erased(),
                provider_config.clone(),
            )
        });

        Self {
            provider,
            signer_provider,
            wallet,
            rpc_url,
            contract_address,
            expected_chain_id,
        }
    }
}

impl SimpleStorageClient {
    /// Creates a read-only client for the default deployment.
    pub fn from_url(rpc_url: Url) -> Self {
        Self::builder().rpc_url(rpc_url).build()
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.expected_chain_id
    }

    /// Address of the configured wallet, if any.
    pub fn owner_address(&self) -> Option<Address> {
        self.wallet.as_ref().map(|wallet| wallet.address())
    }

    /// Gets the chain ID from the provider.
    pub async fn get_chain_id(&self) -> Result<u64, Error> {
        Ok(self
            .provider
            .get_chain_id()
            .await
            .map_err(rpc::Error::from)?)
    }

    /// Gets the current block number from the chain.
    pub async fn get_current_block_number(&self) -> Result<u64, Error> {
        Ok(self
            .provider
            .get_block_number()
            .await
            .map_err(rpc::Error::from)?)
    }

    /// Reads the value currently stored in the contract.
    pub async fn get_value(&self) -> Result<U256, Error> {
        let tx = TransactionRequest::default()
            .with_to(self.contract_address)
            .with_input(eth::get_value_calldata());
        let output = self.provider.call(tx).await.map_err(rpc::Error::from)?;
        let value = eth::decode_value(&output)?;
        log::debug!("getValue() = {value}");
        Ok(value)
    }

    /// Gets an account's native balance in wei.
    pub async fn get_balance_wei(&self, account: Address) -> Result<U256, Error> {
        Ok(self
            .provider
            .get_balance(account)
            .await
            .map_err(rpc::Error::from)?)
    }

    /// Gets an account's native balance as a `BigDecimal`.
    pub async fn get_balance(&self, account: Address) -> Result<BigDecimal, Error> {
        let wei = self.get_balance_wei(account).await?;
        wei_to_eth(wei).map_err(|e| Error::Rpc(rpc::Error::UnexpectedError(e.to_string())))
    }

    /// Fetches every `ValueUpdated` event emitted in the inclusive block range,
    /// in the order the node returns them (ascending block number).
    pub async fn get_value_updated_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ValueUpdatedEvent>, Error> {
        events::check_block_range(from_block, to_block)?;

        let filter = eth::value_updated_filter(self.contract_address, from_block, to_block);
        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(rpc::Error::from)?;
        log::debug!(
            "Fetched {} ValueUpdated logs in blocks {from_block}..={to_block}",
            logs.len()
        );

        Ok(logs
            .into_iter()
            .map(ValueUpdatedEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Validates the query, fetches the events of its range and returns the requested page.
    pub async fn get_events_page(
        &self,
        query: EventsQuery,
    ) -> Result<Page<ValueUpdatedEvent>, Error> {
        query.validate()?;
        let events = self
            .get_value_updated_events(query.from_block, query.to_block)
            .await?;
        Ok(events::paginate(events, query.page, query.limit))
    }

    /// Builds a query covering the last `lookback` blocks up to the chain head.
    pub async fn default_events_query(&self, lookback: u64) -> Result<EventsQuery, Error> {
        let current = self.get_current_block_number().await?;
        Ok(EventsQuery::new(current.saturating_sub(lookback), current))
    }

    /// Reports the configured wallet's address, network and, on the expected network, balance.
    pub async fn wallet_status(&self) -> Result<WalletStatus, Error> {
        let address = self.owner_address().ok_or(Error::NoWallet)?;
        let chain_id = self.get_chain_id().await?;
        let status = WalletStatus::new(address, chain_id, self.expected_chain_id);
        if !status.is_on_expected_network() {
            log::warn!(
                "Wallet {address} is on chain {chain_id}, expected {}",
                self.expected_chain_id
            );
            return Ok(status);
        }
        let balance = self.get_balance_wei(address).await?;
        Ok(status.with_balance(balance))
    }

    /// Stores `value` in the contract and waits for the transaction to be mined.
    pub async fn set_value(&self, value: U256) -> Result<B256, Error> {
        self.set_value_with_status(value, |status| {
            log::debug!("setValue({value}): {}", status.message())
        })
        .await
    }

    /// Stores `value` in the contract, reporting each status change to `on_status`.
    /// Returns the hash of the confirmed transaction.
    pub async fn set_value_with_status<F>(&self, value: U256, mut on_status: F) -> Result<B256, Error>
    where
        F: FnMut(&TxStatus),
    {
        let (Some(provider), Some(from)) = (self.signer_provider.as_ref(), self.owner_address())
        else {
            return Err(Error::NoWallet);
        };

        let chain_id = self.get_chain_id().await?;
        if chain_id != self.expected_chain_id {
            on_status(&TxStatus::Failed(WRONG_NETWORK_MESSAGE.to_string()));
            return Err(Error::WrongNetwork {
                expected: self.expected_chain_id,
                actual: chain_id,
            });
        }

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(self.contract_address)
            .with_input(eth::set_value_calldata(value));

        on_status(&TxStatus::AwaitingSignature);
        let pending = match provider.send_transaction(tx).await {
            Ok(pending) => pending,
            Err(e) => {
                log::warn!("Sending setValue({value}) failed: {e}");
                let message = write_error_message(&e);
                on_status(&TxStatus::Failed(message.clone()));
                return Err(Error::TransactionFailed(message));
            }
        };

        let tx_hash = *pending.tx_hash();
        log::info!("setValue({value}) sent in transaction {tx_hash}");
        on_status(&TxStatus::Confirming(tx_hash));

        let receipt = match provider.wait_for_receipt(tx_hash).await {
            Ok(receipt) => receipt,
            Err(e) => {
                log::warn!("Waiting for receipt of {tx_hash} failed: {e}");
                on_status(&TxStatus::Failed(write_error_message(&e)));
                return Err(Error::Rpc(rpc::Error::from(e)));
            }
        };

        if !receipt.status() {
            on_status(&TxStatus::Failed(REVERTED_MESSAGE.to_string()));
            return Err(Error::TransactionReverted(tx_hash));
        }

        log::info!(
            "setValue({value}) confirmed in block {}",
            receipt
                .block_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string())
        );
        on_status(&TxStatus::Confirmed(tx_hash));
        Ok(tx_hash)
    }
}
