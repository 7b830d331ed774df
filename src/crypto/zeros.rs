//! Per-level empty-subtree ("zero") values.
//!
//! `zero(0)` is the pool's published base constant, `keccak256("tornado")`
//! reduced into the field; `zero(l) = combine(zero(l-1), zero(l-1))`. The
//! cache must be derived with the same hasher instance used for real nodes
//! — deriving zeros with one primitive and nodes with another silently
//! diverges every proof from the ledger's tree.

use alloy::primitives::b256;

use crate::{
    crypto::mimc::MimcSponge,
    domain::field::{
        FieldElement,
        FieldInput,
    },
};

/// keccak256("tornado") mod p, the published level-0 zero value.
pub const BASE_ZERO_VALUE: alloy::primitives::B256 =
    b256!("2fe54c60d3acabf3343a35b6eba15db4821b340f76e741e2249685ed4899af6c");

/// Memoized zero values for levels `0..=depth`.
pub struct ZeroCache {
    zeros: Vec<FieldElement>,
}

impl ZeroCache {
    /// Precompute all levels bottom-up with `hasher`.
    pub fn new(hasher: &MimcSponge, depth: u32) -> Self {
        let base = FieldInput::from(BASE_ZERO_VALUE)
            .to_field()
            .expect("base zero constant is a valid field element");
        let mut zeros = Vec::with_capacity(depth as usize + 1);
        zeros.push(base);
        for level in 1..=depth {
            let below = zeros[level as usize - 1];
            zeros.push(hasher.combine(&below, &below));
        }
        Self { zeros }
    }

    /// The zero value at `level`. Panics if `level` exceeds the depth the
    /// cache was built for; the tree engine never asks beyond its depth.
    pub fn zero(&self, level: u32) -> FieldElement {
        self.zeros[level as usize]
    }

    pub fn depth(&self) -> u32 {
        (self.zeros.len() - 1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_zero_matches_published_constant() {
        let cache = ZeroCache::new(&MimcSponge::new(), 0);
        // decimal form used by the JS client
        assert_eq!(
            FieldInput::Decimal(
                "21663839004416932945382355908790599225266501822907911457504978515578255421292"
                    .into()
            )
            .to_field()
            .unwrap(),
            cache.zero(0)
        );
    }

    #[test]
    fn test_recurrence_holds_at_every_level() {
        let hasher = MimcSponge::new();
        let cache = ZeroCache::new(&hasher, 8);
        for level in 1..=8 {
            assert_eq!(
                cache.zero(level),
                hasher.combine(&cache.zero(level - 1), &cache.zero(level - 1)),
                "zero({level}) must be combine of the level below"
            );
        }
    }

    #[test]
    fn test_zeros_match_onchain_table() {
        // zeros(1) and zeros(2) as hardcoded in the deployed tree contract.
        let cache = ZeroCache::new(&MimcSponge::new(), 20);
        assert_eq!(
            cache.zero(1).to_hex(),
            "256a6135777eee2fd26f54b8b7037a25439d5235caee224154186d2b8a52e31d"
        );
        assert_eq!(
            cache.zero(2).to_hex(),
            "1151949895e82ab19924de92c40a3d6f7bcb60d92b00504b8199613683f0c200"
        );
        assert_eq!(
            cache.zero(3).to_hex(),
            "20121ee811489ff8d61f09fb89e313f14959a0f28bb428a20dba6b0b068b3bdb"
        );
        assert_eq!(
            cache.zero(20).to_hex(),
            "29d7ed391256ccc3ea596c86e933b89ff339d25ea8ddced975ae2fe30b5296d4"
        );
    }
}
