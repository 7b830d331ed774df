use std::{
    future::Future,
    time::Duration,
};

use alloy::primitives::{
    Address,
    Bytes,
    U256,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    field::FieldElement,
    merkle::InclusionProof,
    note::DepositNote,
};

/// Everything the withdrawal circuit needs: the public statement (root,
/// nullifier hash, payout parameters) and the private witness (note
/// secrets plus the inclusion path).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawWitness {
    pub root: FieldElement,
    pub nullifier_hash: FieldElement,
    pub recipient: Address,
    pub relayer: Address,
    pub fee: U256,
    pub refund: U256,
    pub nullifier: FieldElement,
    pub secret: FieldElement,
    pub path_elements: Vec<FieldElement>,
    pub path_indices: Vec<u8>,
}

impl WithdrawWitness {
    /// Assemble the circuit input from an inclusion proof and the note it
    /// belongs to. The nullifier hash is computed by the external proving
    /// toolchain (a different hash than the tree's) and passed through.
    pub fn assemble(
        proof: &InclusionProof,
        note: &DepositNote,
        nullifier_hash: FieldElement,
        recipient: Address,
        relayer: Address,
        fee: U256,
        refund: U256,
    ) -> Self {
        Self {
            root: proof.root,
            nullifier_hash,
            recipient,
            relayer,
            fee,
            refund,
            nullifier: note.nullifier,
            secret: note.secret,
            path_elements: proof.path_elements.clone(),
            path_indices: proof.path_indices.clone(),
        }
    }
}

/// Opaque proof blob produced by the external proving system. Decoding it
/// for the ledger's VM ABI happens outside this crate.
#[derive(Debug, Clone)]
pub struct PoolProof {
    pub calldata: Bytes,
}

/// Errors from proof generation.
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("external prover timed out after {0:?}")]
    Timeout(Duration),

    #[error("prover failed: {0}")]
    Failed(String),

    #[error("prover produced invalid output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Trait for generating withdrawal proofs.
///
/// Proving is an opaque blocking external call bounded by a caller-imposed
/// wall-clock timeout; on expiry it reports [`ProverError::Timeout`] and is
/// not retried here — the caller owns retry policy.
pub trait Prover: Send + Sync {
    fn prove_withdrawal(
        &self,
        witness: &WithdrawWitness,
    ) -> impl Future<Output = Result<PoolProof, ProverError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        field::FieldInput,
        tree::Leaf,
    };

    #[test]
    fn test_assemble_carries_proof_and_note() {
        let fe = |n: u64| FieldInput::from(n).to_field().unwrap();
        let proof = InclusionProof {
            leaf: Leaf {
                hash: fe(42),
                data: "42".into(),
                index: 0,
                created_at: chrono::Utc::now(),
            },
            path_elements: vec![fe(1), fe(2)],
            path_indices: vec![0, 1],
            root: fe(99),
            depth: 2,
        };
        let note = DepositNote::random();

        let witness = WithdrawWitness::assemble(
            &proof,
            &note,
            fe(7),
            Address::repeat_byte(0x11),
            Address::ZERO,
            U256::from(100u64),
            U256::ZERO,
        );
        assert_eq!(witness.root, proof.root);
        assert_eq!(witness.nullifier, note.nullifier);
        assert_eq!(witness.secret, note.secret);
        assert_eq!(witness.path_elements, proof.path_elements);
        assert_eq!(witness.path_indices, proof.path_indices);
    }
}
