//! The incremental Merkle tree engine.
//!
//! Append-only: leaves land at the next free index and only the sibling
//! path to the root is recomputed. Positions that were never touched by a
//! real leaf are implicitly the level's zero value; the lookup fallback is
//! explicit at every call site.

use std::collections::BTreeMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    crypto::{
        mimc::MimcSponge,
        zeros::ZeroCache,
    },
    domain::{
        field::{
            FieldElement,
            FieldError,
            FieldInput,
        },
        merkle::InclusionProof,
    },
    ports::store::{
        StateStore,
        StoreError,
    },
};

/// Upper bound on configurable tree depth (capacity 2^32 leaves).
pub const MAX_TREE_DEPTH: u32 = 32;

/// Node address: (level, index). Level 0 is the leaves, `depth` the root.
pub type NodeKey = (u32, u64);

#[derive(Debug, Error)]
pub enum TreeError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("leaf already exists: {0}")]
    DuplicateLeaf(FieldElement),

    #[error("tree is full: capacity {0} reached")]
    TreeFull(u64),

    #[error("leaf not found: {0}")]
    LeafNotFound(FieldElement),

    #[error("tree depth {0} out of range (1..=32)")]
    DepthOutOfRange(u32),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// One recorded leaf: the canonical hash, the payload exactly as the caller
/// supplied it, the assigned index and the insertion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaf {
    pub hash: FieldElement,
    pub data: String,
    pub index: u64,
    pub created_at: DateTime<Utc>,
}

/// The complete tree state: owned by the store on disk, operated on in
/// memory by the engine. Only materialized nodes are kept; everything else
/// is the level's zero value.
#[derive(Debug, Clone)]
pub struct TreeState {
    pub(crate) depth: u32,
    pub(crate) next_index: u64,
    pub(crate) leaves: Vec<Leaf>,
    pub(crate) nodes: BTreeMap<NodeKey, FieldElement>,
}

impl TreeState {
    pub(crate) fn empty(depth: u32) -> Self {
        Self {
            depth,
            next_index: 0,
            leaves: Vec::new(),
            nodes: BTreeMap::new(),
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn node(&self, level: u32, index: u64) -> Option<FieldElement> {
        self.nodes.get(&(level, index)).copied()
    }
}

/// Result of a successful insertion.
#[derive(Debug, Clone)]
pub struct LeafInsertion {
    pub leaf: Leaf,
    pub root: FieldElement,
}

/// Occupancy snapshot, mirroring what operators watch during syncs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub leaf_count: u64,
    pub capacity: u64,
    pub depth: u32,
    pub root: FieldElement,
    pub utilization: f64,
}

/// The incremental tree engine. Holds the loaded state plus the hasher and
/// zero cache; every mutating operation takes the store explicitly and
/// persists before returning.
pub struct MerkleTree {
    depth: u32,
    state: TreeState,
    zeros: ZeroCache,
    hasher: MimcSponge,
}

impl MerkleTree {
    /// Open the tree at `depth`, loading persisted state or starting fresh.
    ///
    /// A brand-new (or freshly reinitialized) tree gets its root node
    /// seeded with `zero(depth)` and saved immediately, so `root()` is
    /// defined before the first insertion.
    pub fn open<S: StateStore>(store: &S, depth: u32) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(TreeError::DepthOutOfRange(depth));
        }
        let hasher = MimcSponge::new();
        let zeros = ZeroCache::new(&hasher, depth);
        let mut state = match store.load(depth)? {
            Some(state) => state,
            None => TreeState::empty(depth),
        };
        if state.node(depth, 0).is_none() {
            state.nodes.insert((depth, 0), zeros.zero(depth));
            store.save(&state)?;
        }
        Ok(Self {
            depth,
            state,
            zeros,
            hasher,
        })
    }

    /// Append a leaf and recompute its path to the root.
    ///
    /// All-or-nothing: the leaf, the updated ancestors and the advanced
    /// index are persisted together, and if the save fails every in-memory
    /// change is rolled back so this view never runs ahead of the durable
    /// file.
    pub fn add_leaf<S: StateStore>(
        &mut self,
        store: &S,
        input: FieldInput,
    ) -> Result<LeafInsertion, TreeError> {
        let hash = input.to_field()?;
        if self.state.leaves.iter().any(|leaf| leaf.hash == hash) {
            return Err(TreeError::DuplicateLeaf(hash));
        }
        let index = self.state.next_index;
        let capacity = 1u64 << self.depth;
        if index >= capacity {
            return Err(TreeError::TreeFull(capacity));
        }

        // journal of overwritten nodes, for rollback on a failed save
        let mut journal: Vec<(NodeKey, Option<FieldElement>)> =
            Vec::with_capacity(self.depth as usize + 1);
        journal.push(((0, index), self.state.nodes.insert((0, index), hash)));

        let mut current = index;
        for level in 1..=self.depth {
            let parent = current / 2;
            let left = self.node_or_zero(level - 1, parent * 2);
            let right = self.node_or_zero(level - 1, parent * 2 + 1);
            let value = self.hasher.combine(&left, &right);
            journal.push(((level, parent), self.state.nodes.insert((level, parent), value)));
            current = parent;
        }

        let leaf = Leaf {
            hash,
            data: input.raw(),
            index,
            created_at: Utc::now(),
        };
        self.state.leaves.push(leaf.clone());
        self.state.next_index += 1;

        if let Err(err) = store.save(&self.state) {
            self.state.leaves.pop();
            self.state.next_index -= 1;
            for (key, previous) in journal.into_iter().rev() {
                match previous {
                    Some(value) => self.state.nodes.insert(key, value),
                    None => self.state.nodes.remove(&key),
                };
            }
            return Err(err.into());
        }

        debug!(index, root = %self.root(), "leaf inserted");
        Ok(LeafInsertion {
            leaf,
            root: self.root(),
        })
    }

    /// Extract the sibling path for a previously inserted leaf.
    pub fn proof(&self, leaf: FieldInput) -> Result<InclusionProof, TreeError> {
        let hash = leaf.to_field()?;
        let record = self
            .state
            .leaves
            .iter()
            .find(|leaf| leaf.hash == hash)
            .ok_or(TreeError::LeafNotFound(hash))?
            .clone();

        let mut path_elements = Vec::with_capacity(self.depth as usize);
        let mut path_indices = Vec::with_capacity(self.depth as usize);
        let mut current = record.index;
        for level in 0..self.depth {
            let is_left = current % 2 == 0;
            let sibling = if is_left { current + 1 } else { current - 1 };
            path_elements.push(self.node_or_zero(level, sibling));
            path_indices.push(if is_left { 0 } else { 1 });
            current /= 2;
        }

        Ok(InclusionProof {
            leaf: record,
            path_elements,
            path_indices,
            root: self.root(),
            depth: self.depth,
        })
    }

    /// The current root. Defined even for an empty tree (the seeded zero).
    pub fn root(&self) -> FieldElement {
        self.node_or_zero(self.depth, 0)
    }

    pub fn leaves(&self) -> &[Leaf] {
        self.state.leaves()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn next_index(&self) -> u64 {
        self.state.next_index
    }

    pub fn stats(&self) -> TreeStats {
        let capacity = 1u64 << self.depth;
        TreeStats {
            leaf_count: self.state.next_index,
            capacity,
            depth: self.depth,
            root: self.root(),
            utilization: self.state.next_index as f64 / capacity as f64,
        }
    }

    /// Discard every leaf and node and persist the fresh state. The new
    /// state is saved before the in-memory view switches over.
    pub fn reset<S: StateStore>(&mut self, store: &S) -> Result<(), TreeError> {
        let mut state = TreeState::empty(self.depth);
        state.nodes.insert((self.depth, 0), self.zeros.zero(self.depth));
        store.save(&state)?;
        self.state = state;
        Ok(())
    }

    /// The hasher shared with proofs and zero derivation.
    pub fn hasher(&self) -> &MimcSponge {
        &self.hasher
    }

    fn node_or_zero(&self, level: u32, index: u64) -> FieldElement {
        self.state
            .nodes
            .get(&(level, index))
            .copied()
            .unwrap_or_else(|| self.zeros.zero(level))
    }
}
