//! Read-only Ethereum RPC adapter for the pool ledger.
//!
//! Only view calls and log queries: deposits and withdrawals are submitted
//! by other tooling, so this client never needs a signer. Deposit history
//! is scanned in bounded block ranges because public RPC endpoints cap the
//! span of a single `eth_getLogs` request.

use alloy::{
    primitives::Address,
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
    sol,
};
use tracing::debug;

use crate::{
    domain::field::{
        FieldElement,
        FieldInput,
    },
    ports::ledger::{
        DepositEvent,
        LedgerError,
        PoolLedger,
    },
};

sol! {
    #[sol(rpc)]
    interface IPrivacyPool {
        function levels() external view returns (uint32);
        function getLastRoot() external view returns (bytes32);
        function nextIndex() external view returns (uint32);

        event Deposit(bytes32 indexed commitment, uint32 leafIndex, uint256 timestamp);
    }
}

/// Alloy-backed [`PoolLedger`].
pub struct EthereumRpc {
    provider: DynProvider,
    pool: Address,
    start_block: u64,
    chunk_size: u64,
}

impl EthereumRpc {
    /// Connect to `rpc_url`. `start_block` should be the pool's deployment
    /// block to keep log scans cheap; `chunk_size` bounds each
    /// `eth_getLogs` span.
    pub fn new(
        rpc_url: &str,
        pool: Address,
        start_block: u64,
        chunk_size: u64,
    ) -> Result<Self, LedgerError> {
        let url = rpc_url
            .parse()
            .map_err(|e| LedgerError::RpcError(format!("Invalid RPC URL: {}", e)))?;
        let provider = DynProvider::new(ProviderBuilder::new().connect_http(url));
        Ok(Self {
            provider,
            pool,
            start_block,
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn pool_address(&self) -> Address {
        self.pool
    }
}

impl PoolLedger for EthereumRpc {
    async fn tree_depth(&self) -> Result<u32, LedgerError> {
        let pool = IPrivacyPool::new(self.pool, &self.provider);
        let depth = pool
            .levels()
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))?;
        Ok(depth)
    }

    async fn latest_root(&self) -> Result<FieldElement, LedgerError> {
        let pool = IPrivacyPool::new(self.pool, &self.provider);
        let root = pool
            .getLastRoot()
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))?;
        FieldInput::from(root)
            .to_field()
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    async fn deposit_events(&self) -> Result<Vec<DepositEvent>, LedgerError> {
        let pool = IPrivacyPool::new(self.pool, &self.provider);
        let latest = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| LedgerError::RpcError(e.to_string()))?;

        let mut events = Vec::new();
        let mut from = self.start_block;
        while from <= latest {
            let to = latest.min(from + self.chunk_size - 1);
            let logs = pool
                .Deposit_filter()
                .from_block(from)
                .to_block(to)
                .query()
                .await
                .map_err(|e| LedgerError::RpcError(e.to_string()))?;
            debug!(from, to, count = logs.len(), "fetched deposit logs");
            for (event, _log) in logs {
                let commitment = FieldInput::from(event.commitment)
                    .to_field()
                    .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
                events.push(DepositEvent {
                    commitment,
                    leaf_index: u64::from(event.leafIndex),
                    timestamp: event.timestamp.try_into().unwrap_or(u64::MAX),
                });
            }
            from = to + 1;
        }
        Ok(events)
    }
}
