//! Circuit-facing inclusion proofs.

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    crypto::mimc::MimcSponge,
    domain::{
        field::FieldElement,
        tree::Leaf,
    },
};

/// Sibling path for one leaf, in root-ward order. This is the exact shape
/// the withdrawal circuit consumes: one sibling element and one direction
/// bit per level, 0 meaning the current node is the left child.
///
/// A proof is a snapshot: it is valid only against the `root` it was
/// generated with and goes stale the moment the tree gains another leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    /// The proven leaf as recorded in the tree.
    pub leaf: Leaf,
    /// Sibling values, one per level, leaf-adjacent first.
    pub path_elements: Vec<FieldElement>,
    /// Direction bits, same order: 0 = current node is left, 1 = right.
    pub path_indices: Vec<u8>,
    /// The root this path folds up to.
    pub root: FieldElement,
    /// Tree depth at generation time.
    pub depth: u32,
}

impl InclusionProof {
    /// Recompute the root from this proof's own components.
    pub fn verify(&self, hasher: &MimcSponge) -> bool {
        verify_path(
            hasher,
            &self.leaf.hash,
            &self.path_elements,
            &self.path_indices,
            &self.root,
        )
    }
}

/// Fold `combine` over a sibling path and compare against `expected_root`.
///
/// Pure recomputation with no dependency on any persisted tree state, which
/// is what allows a path produced off-chain to be checked against a root
/// reported by the ledger. Direction bit 0 places the running value on the
/// left, 1 on the right.
pub fn verify_path(
    hasher: &MimcSponge,
    leaf: &FieldElement,
    path_elements: &[FieldElement],
    path_indices: &[u8],
    expected_root: &FieldElement,
) -> bool {
    if path_elements.len() != path_indices.len() {
        return false;
    }
    let mut current = *leaf;
    for (sibling, bit) in path_elements.iter().zip(path_indices) {
        current = if *bit == 0 {
            hasher.combine(&current, sibling)
        } else {
            hasher.combine(sibling, &current)
        };
    }
    current == *expected_root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::FieldInput;

    fn fe(n: u64) -> FieldElement {
        FieldInput::from(n).to_field().unwrap()
    }

    #[test]
    fn test_verify_single_level() {
        let hasher = MimcSponge::new();
        let leaf = fe(5);
        let sibling = fe(6);
        let root = hasher.combine(&leaf, &sibling);
        assert!(verify_path(&hasher, &leaf, &[sibling], &[0], &root));
        // same sibling on the wrong side
        assert!(!verify_path(&hasher, &leaf, &[sibling], &[1], &root));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let hasher = MimcSponge::new();
        let root = fe(1);
        assert!(!verify_path(&hasher, &fe(1), &[fe(2)], &[0, 1], &root));
    }

    #[test]
    fn test_tampered_element_rejected() {
        let hasher = MimcSponge::new();
        let leaf = fe(5);
        let sibling = fe(6);
        let root = hasher.combine(&leaf, &sibling);
        assert!(!verify_path(&hasher, &leaf, &[fe(7)], &[0], &root));
    }
}
