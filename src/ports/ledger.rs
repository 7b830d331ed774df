use std::future::Future;

use thiserror::Error;

use crate::domain::field::FieldElement;

/// One historical leaf insertion as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    /// The committed leaf value, already field-reduced.
    pub commitment: FieldElement,
    /// The index the on-chain tree assigned to it.
    pub leaf_index: u64,
    /// Ledger timestamp of the insertion (seconds).
    pub timestamp: u64,
}

/// Errors from talking to the pool ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("contract error: {0}")]
    ContractError(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Read-only view of the pool contract's tree.
///
/// The ledger maintains its own incremental tree with the same hash
/// primitive; this port exposes just enough of it to rebuild a local
/// replica and cross-check roots.
pub trait PoolLedger: Send + Sync {
    /// The depth (`levels()`) of the on-chain tree.
    fn tree_depth(&self) -> impl Future<Output = Result<u32, LedgerError>> + Send;

    /// The root the ledger currently reports.
    fn latest_root(&self) -> impl Future<Output = Result<FieldElement, LedgerError>> + Send;

    /// All historical deposit events. Order is not guaranteed; the caller
    /// sorts by `leaf_index` before replaying.
    fn deposit_events(
        &self,
    ) -> impl Future<Output = Result<Vec<DepositEvent>, LedgerError>> + Send;
}
