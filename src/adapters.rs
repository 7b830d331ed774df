pub mod ethereum_rpc;
pub mod json_store;
pub mod snark_prover;
