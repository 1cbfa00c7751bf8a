use alloy::consensus::transaction::SignerRecoverable;
use alloy::consensus::{
    Eip658Value, Receipt, ReceiptEnvelope, ReceiptWithBloom, Transaction, TxEnvelope,
};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, B256, Bloom, Bytes, U64, U128, U256, keccak256};
use alloy::rpc::types::{
    BlockId, BlockNumberOrTag, Filter, Log, TransactionReceipt, TransactionRequest,
};
use alloy::sol_types::{SolCall, SolEvent};
use jsonrpsee::core::{RpcResult, async_trait};
use jsonrpsee::server::{RpcModule, ServerBuilder, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use simple_storage_sdk::eth::{DEFAULT_CONTRACT_ADDRESS, SimpleStorage};
use simple_storage_sdk::events::MAX_BLOCK_RANGE;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

use crate::{TEST_CHAIN_ID, TEST_HEAD_BLOCK};

pub mod api;
pub mod controller;

use api::EthRpcServer;
pub use controller::{CallOverride, CallResponse, MockController};

/// Error code used by nodes for generic server errors.
const SERVER_ERROR_CODE: i32 = -32000;

const GAS_ESTIMATE: u64 = 50_000;
const BASE_FEE: u128 = 25_000_000_000;
const PRIORITY_FEE: u128 = 1_000_000_000;

fn rpc_error(message: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(SERVER_ERROR_CODE, message.into(), None::<()>)
}

fn block_hash(block: u64) -> B256 {
    keccak256(block.to_be_bytes())
}

/// What happens to transactions sent to the mock node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TxOutcome {
    /// Mined in the next block. `setValue` stores the value and emits `ValueUpdated`.
    #[default]
    Success,
    /// Mined in the next block with a failed status and no effect.
    Revert,
    /// Accepted but never mined.
    Dropped,
}

#[derive(Debug)]
struct MockNodeData {
    chain_id: u64,
    head_block: u64,
    value: U256,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    logs: Vec<Log>,
    receipts: HashMap<B256, TransactionReceipt>,
    tx_outcome: TxOutcome,
}

impl Default for MockNodeData {
    fn default() -> Self {
        Self {
            chain_id: TEST_CHAIN_ID,
            head_block: TEST_HEAD_BLOCK,
            value: U256::ZERO,
            balances: HashMap::new(),
            nonces: HashMap::new(),
            logs: Vec::new(),
            receipts: HashMap::new(),
            tx_outcome: TxOutcome::default(),
        }
    }
}

impl MockNodeData {
    /// Stores `value` and records its `ValueUpdated` log at `block`.
    fn record_value_update(
        &mut self,
        contract: Address,
        block: u64,
        value: U256,
        tx_hash: B256,
    ) -> Log {
        let event = SimpleStorage::ValueUpdated { newValue: value };
        let log = Log {
            inner: alloy::primitives::Log {
                address: contract,
                data: event.encode_log_data(),
            },
            block_hash: Some(block_hash(block)),
            block_number: Some(block),
            block_timestamp: None,
            transaction_hash: Some(tx_hash),
            transaction_index: Some(0),
            log_index: Some(self.logs.len() as u64),
            removed: false,
        };
        self.logs.push(log.clone());
        self.logs.sort_by_key(|log| log.block_number);

        self.value = value;
        self.head_block = self.head_block.max(block);
        log
    }
}

fn mined_receipt(
    tx_hash: B256,
    from: Address,
    to: Option<Address>,
    block: u64,
    success: bool,
    logs: Vec<Log>,
) -> TransactionReceipt {
    let receipt = Receipt {
        status: Eip658Value::Eip658(success),
        cumulative_gas_used: GAS_ESTIMATE,
        logs,
    };
    TransactionReceipt {
        inner: ReceiptEnvelope::Eip1559(ReceiptWithBloom {
            receipt,
            logs_bloom: Bloom::default(),
        }),
        transaction_hash: tx_hash,
        transaction_index: Some(0),
        block_hash: Some(block_hash(block)),
        block_number: Some(block),
        gas_used: GAS_ESTIMATE,
        effective_gas_price: BASE_FEE + PRIORITY_FEE,
        blob_gas_used: None,
        blob_gas_price: None,
        from,
        to,
        contract_address: None,
    }
}

/// JSON-RPC handlers backed by in-memory chain state.
#[derive(Clone)]
struct MockRpc {
    data: Arc<RwLock<MockNodeData>>,
    controller: MockController,
    contract: Address,
}

impl MockRpc {
    /// Applies a forced response registered for `method`, if any.
    async fn apply_override(&self, method: &str) -> RpcResult<()> {
        match self.controller.take_next_override(method) {
            Some(CallResponse::Error(message)) => Err(rpc_error(message)),
            Some(CallResponse::ErrorWithCode { code, message }) => {
                Err(ErrorObjectOwned::owned(code, message, None::<()>))
            }
            Some(CallResponse::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EthRpcServer for MockRpc {
    async fn chain_id(&self) -> RpcResult<U64> {
        self.apply_override("eth_chainId").await?;
        Ok(U64::from(self.data.read().await.chain_id))
    }

    async fn block_number(&self) -> RpcResult<U64> {
        self.apply_override("eth_blockNumber").await?;
        Ok(U64::from(self.data.read().await.head_block))
    }

    async fn get_balance(&self, address: Address, _block: Option<BlockId>) -> RpcResult<U256> {
        self.apply_override("eth_getBalance").await?;
        let balance = self
            .data
            .read()
            .await
            .balances
            .get(&address)
            .copied()
            .unwrap_or(U256::ZERO);
        Ok(balance)
    }

    async fn call(
        &self,
        request: TransactionRequest,
        _block: Option<BlockId>,
        _state_overrides: Option<serde_json::Value>,
    ) -> RpcResult<Bytes> {
        self.apply_override("eth_call").await?;

        if request.to.and_then(|to| to.to().copied()) != Some(self.contract) {
            return Ok(Bytes::new());
        }
        let input = request.input.input().cloned().unwrap_or_default();
        if !input.starts_with(&SimpleStorage::getValueCall::SELECTOR) {
            return Err(rpc_error("execution reverted"));
        }
        let value = self.data.read().await.value;
        Ok(Bytes::from(value.to_be_bytes::<32>().to_vec()))
    }

    async fn get_logs(&self, filter: Filter) -> RpcResult<Vec<Log>> {
        self.apply_override("eth_getLogs").await?;

        let data = self.data.read().await;
        let from = filter.get_from_block().unwrap_or(0);
        let to = filter.get_to_block().unwrap_or(data.head_block);
        if to.saturating_sub(from) >= MAX_BLOCK_RANGE {
            return Err(rpc_error(format!(
                "requested too many blocks from {from} to {to}, maximum is set to {MAX_BLOCK_RANGE}"
            )));
        }

        let logs = data
            .logs
            .iter()
            .filter(|log| filter.address.matches(&log.inner.address))
            .filter(|log| {
                log.block_number
                    .is_some_and(|block| block >= from && block <= to)
            })
            .cloned()
            .collect();
        Ok(logs)
    }

    async fn get_transaction_count(
        &self,
        address: Address,
        _block: Option<BlockId>,
    ) -> RpcResult<U64> {
        self.apply_override("eth_getTransactionCount").await?;
        let nonce = self
            .data
            .read()
            .await
            .nonces
            .get(&address)
            .copied()
            .unwrap_or(0);
        Ok(U64::from(nonce))
    }

    async fn estimate_gas(
        &self,
        _request: serde_json::Value,
        _block: Option<BlockId>,
        _state_overrides: Option<serde_json::Value>,
    ) -> RpcResult<U64> {
        self.apply_override("eth_estimateGas").await?;
        Ok(U64::from(GAS_ESTIMATE))
    }

    async fn gas_price(&self) -> RpcResult<U128> {
        self.apply_override("eth_gasPrice").await?;
        Ok(U128::from(BASE_FEE + PRIORITY_FEE))
    }

    async fn max_priority_fee_per_gas(&self) -> RpcResult<U128> {
        self.apply_override("eth_maxPriorityFeePerGas").await?;
        Ok(U128::from(PRIORITY_FEE))
    }

    async fn fee_history(
        &self,
        block_count: U64,
        _newest_block: BlockNumberOrTag,
        reward_percentiles: Option<Vec<f64>>,
    ) -> RpcResult<serde_json::Value> {
        self.apply_override("eth_feeHistory").await?;
        let count = block_count.to::<u64>().clamp(1, 1024) as usize;
        let head = self.data.read().await.head_block;
        let percentiles = reward_percentiles.unwrap_or_default().len();
        Ok(serde_json::json!({
            "oldestBlock": U64::from(head.saturating_sub(count as u64 - 1)),
            "baseFeePerGas": vec![U128::from(BASE_FEE); count + 1],
            "gasUsedRatio": vec![0.5; count],
            "reward": vec![vec![U128::from(PRIORITY_FEE); percentiles]; count],
        }))
    }

    async fn send_raw_transaction(&self, data: Bytes) -> RpcResult<B256> {
        self.apply_override("eth_sendRawTransaction").await?;

        let envelope = TxEnvelope::decode_2718(&mut data.as_ref())
            .map_err(|e| rpc_error(format!("invalid transaction: {e}")))?;
        let from = envelope
            .recover_signer()
            .map_err(|e| rpc_error(format!("invalid signature: {e}")))?;
        let tx_hash = *envelope.tx_hash();
        let to = envelope.to();

        let mut data = self.data.write().await;
        *data.nonces.entry(from).or_default() += 1;

        let success = match data.tx_outcome {
            TxOutcome::Success => true,
            TxOutcome::Revert => false,
            TxOutcome::Dropped => {
                log::debug!("Dropping transaction {tx_hash}");
                return Ok(tx_hash);
            }
        };

        let block = data.head_block + 1;
        data.head_block = block;
        let mut logs = Vec::new();
        if success && to == Some(self.contract) {
            match SimpleStorage::setValueCall::abi_decode(envelope.input()) {
                Ok(call) => {
                    logs.push(data.record_value_update(self.contract, block, call._value, tx_hash))
                }
                Err(e) => return Err(rpc_error(format!("execution reverted: {e}"))),
            }
        }
        log::debug!("Mined transaction {tx_hash} from {from} in block {block} (success: {success})");
        data.receipts
            .insert(tx_hash, mined_receipt(tx_hash, from, to, block, success, logs));
        Ok(tx_hash)
    }

    async fn get_transaction_receipt(&self, hash: B256) -> RpcResult<Option<TransactionReceipt>> {
        self.apply_override("eth_getTransactionReceipt").await?;
        Ok(self.data.read().await.receipts.get(&hash).cloned())
    }
}

/// In-process JSON-RPC node serving the `SimpleStorage` contract.
/// Stopped when dropped.
pub struct MockNode {
    rpc: MockRpc,
    url: Url,
    #[allow(dead_code)]
    server: ServerHandle,
}

impl MockNode {
    /// Starts a node on a random local port reporting [`TEST_CHAIN_ID`].
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with_chain_id(TEST_CHAIN_ID).await
    }

    pub async fn start_with_chain_id(chain_id: u64) -> anyhow::Result<Self> {
        let rpc = MockRpc {
            data: Arc::new(RwLock::new(MockNodeData {
                chain_id,
                ..Default::default()
            })),
            controller: MockController::new(),
            contract: DEFAULT_CONTRACT_ADDRESS,
        };

        let mut module = RpcModule::new(());
        module.merge(EthRpcServer::into_rpc(rpc.clone()))?;

        let server = ServerBuilder::default().build("127.0.0.1:0").await?;
        let addr = server.local_addr()?;
        let url = Url::parse(&format!("http://{addr}"))?;
        log::info!("Mock node listening on {url} (chain {chain_id})");

        Ok(Self {
            rpc,
            url,
            server: server.start(module),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn controller(&self) -> &MockController {
        &self.rpc.controller
    }

    pub fn contract_address(&self) -> Address {
        self.rpc.contract
    }

    pub async fn set_chain_id(&self, chain_id: u64) {
        self.rpc.data.write().await.chain_id = chain_id;
    }

    pub async fn set_head_block(&self, block: u64) {
        self.rpc.data.write().await.head_block = block;
    }

    pub async fn set_balance(&self, address: Address, wei: u128) {
        self.rpc
            .data
            .write()
            .await
            .balances
            .insert(address, U256::from(wei));
    }

    /// Sets the stored value without emitting an event.
    pub async fn set_value(&self, value: U256) {
        self.rpc.data.write().await.value = value;
    }

    /// Stores `value` as if `setValue` was mined in `block`, recording its
    /// `ValueUpdated` log. Moves the head forward when `block` is past it.
    /// Returns the hash of the emitting transaction.
    pub async fn emit_value_updated(&self, block: u64, value: U256) -> B256 {
        let mut data = self.rpc.data.write().await;
        let tx_hash = keccak256(format!("{block}:{value}:{}", data.logs.len()));
        data.record_value_update(self.rpc.contract, block, value, tx_hash);
        tx_hash
    }

    /// Sets what happens to transactions sent from now on.
    pub async fn set_tx_outcome(&self, outcome: TxOutcome) {
        self.rpc.data.write().await.tx_outcome = outcome;
    }

    /// Number of transactions mined or accepted from `address`.
    pub async fn nonce(&self, address: Address) -> u64 {
        self.rpc
            .data
            .read()
            .await
            .nonces
            .get(&address)
            .copied()
            .unwrap_or(0)
    }
}
