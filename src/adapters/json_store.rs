//! JSON file store for tree state.
//!
//! One document per tree instance, format-compatible with the file the
//! reference JS client writes: `depth`, `nextIndex`, `leaves` (unprefixed
//! lowercase hex hashes, RFC3339 `createdAt`), and `nodes` as one sparse
//! array per level with `null` holes. Saves go to a sibling `.tmp` file and
//! are renamed into place, so a crash mid-write leaves the previous
//! document readable.
//!
//! There is no file lock: two processes writing the same path race and the
//! last rename wins. Single-writer discipline is the caller's problem.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{
        Path,
        PathBuf,
    },
};

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::warn;

use crate::{
    domain::{
        field::{
            FieldElement,
            FieldInput,
        },
        tree::{
            Leaf,
            NodeKey,
            TreeState,
        },
    },
    ports::store::{
        StateStore,
        StoreError,
    },
};

/// File-backed [`StateStore`].
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, depth: u32) -> Result<Option<TreeState>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Unreadable(err)),
        };
        let document: PersistedTree =
            serde_json::from_str(&raw).map_err(|err| StoreError::Malformed(err.to_string()))?;
        if document.depth != depth {
            warn!(
                stored = document.depth,
                requested = depth,
                path = %self.path.display(),
                "state file has a different tree depth; treating as absent"
            );
            return Ok(None);
        }
        document.into_state().map(Some)
    }

    fn save(&self, state: &TreeState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StoreError::Unwritable)?;
            }
        }
        let document = PersistedTree::from_state(state);
        let json = serde_json::to_string_pretty(&document)
            .map_err(|err| StoreError::Malformed(err.to_string()))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(StoreError::Unwritable)?;
        fs::rename(&tmp, &self.path).map_err(StoreError::Unwritable)?;
        Ok(())
    }
}

/// On-disk document shape. Field values are unprefixed lowercase hex here;
/// the `0x`-prefixed form is reserved for the circuit-facing proof
/// representation.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTree {
    depth: u32,
    next_index: u64,
    leaves: Vec<PersistedLeaf>,
    nodes: Vec<Vec<Option<String>>>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedLeaf {
    hash: String,
    data: String,
    index: u64,
    created_at: DateTime<Utc>,
}

impl PersistedTree {
    fn from_state(state: &TreeState) -> Self {
        let mut levels: Vec<Vec<Option<String>>> =
            vec![Vec::new(); state.depth() as usize + 1];
        for (&(level, index), value) in &state.nodes {
            let row = &mut levels[level as usize];
            let slot = index as usize;
            if row.len() <= slot {
                row.resize(slot + 1, None);
            }
            row[slot] = Some(value.to_hex());
        }
        Self {
            depth: state.depth(),
            next_index: state.next_index(),
            leaves: state
                .leaves()
                .iter()
                .map(|leaf| PersistedLeaf {
                    hash: leaf.hash.to_hex(),
                    data: leaf.data.clone(),
                    index: leaf.index,
                    created_at: leaf.created_at,
                })
                .collect(),
            nodes: levels,
        }
    }

    fn into_state(self) -> Result<TreeState, StoreError> {
        let mut nodes: BTreeMap<NodeKey, FieldElement> = BTreeMap::new();
        for (level, row) in self.nodes.iter().enumerate() {
            for (index, slot) in row.iter().enumerate() {
                if let Some(hex) = slot {
                    let value = FieldInput::Hex(hex.clone()).to_field().map_err(|err| {
                        StoreError::Malformed(format!(
                            "node ({level}, {index}): {err}"
                        ))
                    })?;
                    nodes.insert((level as u32, index as u64), value);
                }
            }
        }
        let mut leaves = Vec::with_capacity(self.leaves.len());
        for persisted in self.leaves {
            let hash = FieldInput::Hex(persisted.hash).to_field().map_err(|err| {
                StoreError::Malformed(format!("leaf {}: {err}", persisted.index))
            })?;
            leaves.push(Leaf {
                hash,
                data: persisted.data,
                index: persisted.index,
                created_at: persisted.created_at,
            });
        }
        let mut state = TreeState::empty(self.depth);
        state.next_index = self.next_index;
        state.leaves = leaves;
        state.nodes = nodes;
        Ok(state)
    }
}
