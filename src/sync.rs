//! Rebuilds the local tree from the ledger's deposit history and
//! cross-checks the resulting root.
//!
//! A mismatch means a primitive mismatch, a missing or duplicated event, or
//! wrong replay order — causes this crate cannot distinguish, so the
//! mismatch is surfaced and the tree is never auto-"fixed".

use thiserror::Error;
use tracing::info;

use crate::{
    domain::{
        field::{
            FieldElement,
            FieldInput,
        },
        tree::{
            MerkleTree,
            TreeError,
        },
    },
    ports::{
        ledger::{
            LedgerError,
            PoolLedger,
        },
        store::StateStore,
    },
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("ledger tree depth {ledger} does not match local depth {local}")]
    DepthMismatch { local: u32, ledger: u32 },

    #[error("deposit events are not contiguous: expected index {expected}, found {found}")]
    NonContiguousEvents { expected: u64, found: u64 },

    #[error(
        "root mismatch after replaying {replayed} deposits: local {local}, ledger {ledger}"
    )]
    RootMismatch {
        replayed: u64,
        local: FieldElement,
        ledger: FieldElement,
    },
}

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub replayed: u64,
    pub root: FieldElement,
}

/// Replay the ledger's full deposit history into a fresh local tree and
/// compare roots.
///
/// The local state at `store` is reset and rebuilt; on any error before the
/// final save the previous state may already be gone — a failed sync is
/// rerun from scratch, not resumed.
pub async fn reconcile<L, S>(
    ledger: &L,
    store: &S,
    depth: u32,
) -> Result<SyncReport, SyncError>
where
    L: PoolLedger,
    S: StateStore,
{
    let ledger_depth = ledger.tree_depth().await?;
    if ledger_depth != depth {
        return Err(SyncError::DepthMismatch {
            local: depth,
            ledger: ledger_depth,
        });
    }

    let mut events = ledger.deposit_events().await?;
    events.sort_by_key(|event| event.leaf_index);
    events.dedup();
    for (position, event) in events.iter().enumerate() {
        if event.leaf_index != position as u64 {
            return Err(SyncError::NonContiguousEvents {
                expected: position as u64,
                found: event.leaf_index,
            });
        }
    }
    info!(deposits = events.len(), "replaying ledger history");

    let mut tree = MerkleTree::open(store, depth)?;
    tree.reset(store)?;
    for event in &events {
        tree.add_leaf(store, FieldInput::from(event.commitment))?;
    }

    let local = tree.root();
    let ledger_root = ledger.latest_root().await?;
    if local != ledger_root {
        return Err(SyncError::RootMismatch {
            replayed: events.len() as u64,
            local,
            ledger: ledger_root,
        });
    }

    info!(replayed = events.len(), root = %local, "local tree matches ledger");
    Ok(SyncReport {
        replayed: events.len() as u64,
        root: local,
    })
}
