use crate::domain::tree::TreeState;

/// Port for durable tree state.
///
/// The engine owns an in-memory [`TreeState`] and writes it back through
/// `save` after every mutation; `load` is only called when a tree is opened.
/// The trait is synchronous: the core is single-threaded and every mutation
/// is a full read-modify-write (there is deliberately no locking — two
/// processes writing the same path race, and the loser's update is lost;
/// see DESIGN.md).
///
/// Implementations:
/// - [`crate::adapters::json_store::JsonFileStore`]
pub trait StateStore {
    /// Load previously saved state for a tree of `depth`.
    ///
    /// Returns `Ok(None)` when no usable state exists: the backing file is
    /// absent, or it was written for a different depth (a configuration
    /// mismatch, not a migratable format). Any other failure — unreadable
    /// file, malformed document — is an error, never silently "absent",
    /// so history cannot be discarded by accident.
    fn load(&self, depth: u32) -> Result<Option<TreeState>, StoreError>;

    /// Durably persist `state`, atomically enough that a crash mid-write
    /// leaves the previous document intact.
    fn save(&self, state: &TreeState) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file unreadable: {0}")]
    Unreadable(#[source] std::io::Error),

    #[error("state file unwritable: {0}")]
    Unwritable(#[source] std::io::Error),

    #[error("state file malformed: {0}")]
    Malformed(String),
}
