//! External prover adapter.
//!
//! Proof generation shells out to the proving toolchain (witness
//! calculator + SNARK prover behind one command): the witness is written
//! to the work directory as JSON, the command is invoked with its path,
//! and stdout is expected to carry the hex-encoded proof calldata. The
//! whole invocation is bounded by a wall-clock timeout; an expired run is
//! killed and reported, never retried here.

use std::{
    path::PathBuf,
    time::Duration,
};

use alloy::primitives::Bytes;
use tokio::process::Command;

use crate::ports::prover::{
    PoolProof,
    Prover,
    ProverError,
    WithdrawWitness,
};

/// [`Prover`] that runs an external command.
pub struct CommandProver {
    command: PathBuf,
    args: Vec<String>,
    work_dir: PathBuf,
    timeout: Duration,
}

impl CommandProver {
    pub fn new(
        command: impl Into<PathBuf>,
        args: Vec<String>,
        work_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            work_dir: work_dir.into(),
            timeout,
        }
    }
}

impl Prover for CommandProver {
    async fn prove_withdrawal(
        &self,
        witness: &WithdrawWitness,
    ) -> Result<PoolProof, ProverError> {
        let json = serde_json::to_string_pretty(witness)
            .expect("witness serialization cannot fail");
        std::fs::create_dir_all(&self.work_dir)?;
        let input_path = self.work_dir.join("witness.json");
        std::fs::write(&input_path, json)?;

        let run = Command::new(&self.command)
            .args(&self.args)
            .arg(&input_path)
            .current_dir(&self.work_dir)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ProverError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(ProverError::Failed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let blob = stdout.trim();
        let blob = blob.strip_prefix("0x").unwrap_or(blob);
        let bytes = hex::decode(blob)
            .map_err(|e| ProverError::InvalidOutput(format!("stdout is not hex: {}", e)))?;
        if bytes.is_empty() {
            return Err(ProverError::InvalidOutput("empty proof".into()));
        }
        Ok(PoolProof {
            calldata: Bytes::from(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{
        Address,
        U256,
    };

    use super::*;
    use crate::domain::field::{
        FieldElement,
        FieldInput,
    };

    fn witness() -> WithdrawWitness {
        let fe = |n: u64| -> FieldElement { FieldInput::from(n).to_field().unwrap() };
        WithdrawWitness {
            root: fe(1),
            nullifier_hash: fe(2),
            recipient: Address::ZERO,
            relayer: Address::ZERO,
            fee: U256::ZERO,
            refund: U256::ZERO,
            nullifier: fe(3),
            secret: fe(4),
            path_elements: vec![fe(5), fe(6)],
            path_indices: vec![0, 1],
        }
    }

    #[tokio::test]
    async fn test_stdout_hex_becomes_calldata() {
        let dir = tempfile::tempdir().unwrap();
        let prover = CommandProver::new(
            "sh",
            vec!["-c".into(), "echo 0xdeadbeef".into()],
            dir.path(),
            Duration::from_secs(5),
        );
        let proof = prover.prove_withdrawal(&witness()).await.unwrap();
        assert_eq!(proof.calldata.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let prover = CommandProver::new(
            "sleep",
            vec!["5".into()],
            dir.path(),
            Duration::from_millis(50),
        );
        let err = prover.prove_withdrawal(&witness()).await.unwrap_err();
        assert!(matches!(err, ProverError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let prover = CommandProver::new(
            "sh",
            vec!["-c".into(), "echo broken >&2; exit 1".into()],
            dir.path(),
            Duration::from_secs(5),
        );
        let err = prover.prove_withdrawal(&witness()).await.unwrap_err();
        match err {
            ProverError::Failed(stderr) => assert!(stderr.contains("broken")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_stdout_is_invalid_output() {
        let dir = tempfile::tempdir().unwrap();
        let prover = CommandProver::new(
            "sh",
            vec!["-c".into(), "echo not-a-proof".into()],
            dir.path(),
            Duration::from_secs(5),
        );
        let err = prover.prove_withdrawal(&witness()).await.unwrap_err();
        assert!(matches!(err, ProverError::InvalidOutput(_)));
    }

    #[test]
    fn test_witness_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(witness()).unwrap();
        assert!(json.get("nullifierHash").is_some());
        assert!(json.get("pathElements").is_some());
        assert!(json.get("pathIndices").is_some());
    }
}
