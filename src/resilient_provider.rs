use std::time::Duration;

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider};
use alloy::rpc::types::eth::Filter;
use alloy::rpc::types::{Log, TransactionReceipt, TransactionRequest};
use anyhow::{Result, anyhow};

/// Configuration for the resilient provider retry behavior.
#[derive(Clone, Debug)]
pub struct ResilientProviderConfig {
    /// Maximum number of retry attempts for "error sending request" errors.
    pub max_retries: u32,
    /// Delay between retry attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Timeout in seconds for "no backend is currently healthy" errors.
    pub backend_health_timeout_secs: u64,
    /// Upper bound in milliseconds on a single request attempt.
    pub request_timeout_ms: u64,
    /// How long to wait for a sent transaction to be mined, in milliseconds.
    pub receipt_timeout_ms: u64,
    /// Delay between receipt polls in milliseconds.
    pub receipt_poll_interval_ms: u64,
}

impl Default for ResilientProviderConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 100,
            backend_health_timeout_secs: 30,
            request_timeout_ms: 10_000,
            receipt_timeout_ms: 120_000,
            receipt_poll_interval_ms: 2_000,
        }
    }
}

impl ResilientProviderConfig {
    /// Set the per-attempt request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set how long to wait for a transaction receipt and how often to poll for it
    pub fn with_receipt_wait(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.receipt_timeout_ms = timeout.as_millis() as u64;
        self.receipt_poll_interval_ms = poll_interval.as_millis() as u64;
        self
    }
}

/// A wrapper around DynProvider that retries transient transport errors and bounds
/// every attempt with a timeout.
#[derive(Clone)]
pub struct ResilientProvider {
    provider: DynProvider,
    config: ResilientProviderConfig,
}

impl ResilientProvider {
    /// Creates a new ResilientProvider with the given provider and configuration.
    pub fn new(provider: DynProvider, config: ResilientProviderConfig) -> Self {
        Self { provider, config }
    }

    /// Generic retry function that handles "error sending request" errors and "no backend is currently healthy" errors.
    /// An attempt exceeding `request_timeout_ms` fails immediately with a timeout error.
    async fn retry<T, F, Fut, E>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut attempts = 0;
        let start_time = std::time::Instant::now();
        let request_timeout = Duration::from_millis(self.config.request_timeout_ms);

        loop {
            let outcome = match tokio::time::timeout(request_timeout, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    log::debug!("{operation_name} did not complete within {request_timeout:?}");
                    return Err(anyhow!(
                        "{operation_name} request timeout after {}ms",
                        self.config.request_timeout_ms
                    ));
                }
            };

            match outcome {
                Ok(result) => return Ok(result),
                // This error can be result of load balancer switching.
                // It should be enough to retry a few times for the call to work.
                Err(e) if e.to_string().contains("error sending request") => {
                    attempts += 1;
                    if attempts > self.config.max_retries {
                        return Err(anyhow!(
                            "{operation_name} failed after {} attempts with 'error sending request': {e}",
                            self.config.max_retries,
                        ));
                    }
                    log::debug!(
                        "{operation_name} failed with 'error sending request' (attempt {attempts}/{}). Retrying...",
                        self.config.max_retries
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    continue;
                }
                // Load balancer will be switching backends until it will find a healthy one.
                // We need to retry and wait for some period of time.
                Err(e)
                    if e.to_string()
                        .contains("no backend is currently healthy to serve traffic") =>
                {
                    let elapsed = start_time.elapsed();
                    let timeout_duration =
                        Duration::from_secs(self.config.backend_health_timeout_secs);

                    if elapsed >= timeout_duration {
                        return Err(anyhow!(
                            "{operation_name} failed after {} seconds with 'no backend is currently healthy to serve traffic': {e}",
                            self.config.backend_health_timeout_secs,
                        ));
                    }

                    log::debug!(
                        "{operation_name} failed with 'no backend is currently healthy to serve traffic' (elapsed: {:.1}s/{:.1}s). Retrying...",
                        elapsed.as_secs_f64(),
                        timeout_duration.as_secs_f64()
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    continue;
                }
                Err(e) => return Err(anyhow::Error::new(e)),
            }
        }
    }

    /// Gets the chain ID with retry logic.
    pub async fn get_chain_id(&self) -> Result<u64> {
        self.retry("get_chain_id", || self.provider.get_chain_id())
            .await
    }

    /// Gets the latest block number with retry logic.
    pub async fn get_block_number(&self) -> Result<u64> {
        self.retry("get_block_number", || self.provider.get_block_number())
            .await
    }

    /// Gets the balance for an address with retry logic.
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.retry("get_balance", || async {
            self.provider.get_balance(address).await
        })
        .await
    }

    /// Executes a read-only call against the latest block with retry logic.
    pub async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        self.retry("call", || async { self.provider.call(tx.clone()).await })
            .await
    }

    /// Fetches logs matching the filter with retry logic.
    pub async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        self.retry("get_logs", || self.provider.get_logs(filter))
            .await
    }

    /// Sends a transaction with retry logic.
    pub async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<PendingTransactionBuilder<alloy::network::Ethereum>> {
        self.retry("send_transaction", || {
            self.provider.send_transaction(tx.clone())
        })
        .await
    }

    /// Gets a transaction receipt with retry logic.
    pub async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.retry("get_transaction_receipt", || {
            self.provider.get_transaction_receipt(hash)
        })
        .await
    }

    /// Polls for the receipt of `hash` until it is mined or `receipt_timeout_ms` elapses.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        let start_time = std::time::Instant::now();
        let timeout = Duration::from_millis(self.config.receipt_timeout_ms);
        let poll_interval = Duration::from_millis(self.config.receipt_poll_interval_ms);

        loop {
            if let Some(receipt) = self.get_transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            if start_time.elapsed() >= timeout {
                return Err(anyhow!(
                    "wait_for_receipt timeout after {}ms: transaction {hash} was not mined",
                    self.config.receipt_timeout_ms
                ));
            }
            log::trace!("Transaction {hash} not mined yet");
            tokio::time::sleep(poll_interval).await;
        }
    }
}
