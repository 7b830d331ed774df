//! Off-chain client for a privacy-pool commitment scheme.
//!
//! Depositors insert hidden commitments into an incremental Merkle tree and
//! later withdraw by proving, in zero knowledge, that they know a commitment
//! preimage and that the commitment is a leaf of the tree. The tree here is
//! maintained off-chain but must compute *bit-identical* roots to the
//! independently-maintained on-chain tree (same MiMC-sponge primitive, same
//! zero values, same left/right convention), so that proofs generated against
//! local state verify against ledger state.
//!
//! Layout:
//! - [`domain`] — field codec, deposit notes, the incremental tree engine and
//!   inclusion proofs.
//! - [`crypto`] — the MiMC-sponge compression function and the per-level
//!   empty-subtree zero values.
//! - [`ports`] — traits for the external collaborators: persistent state
//!   store, pool ledger, external prover.
//! - [`adapters`] — JSON file store, alloy-based Ethereum RPC ledger client,
//!   external prover command wrapper.
//! - [`sync`] — rebuilds the tree from ledger events and cross-checks roots.

pub mod adapters;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod ports;
pub mod sync;
