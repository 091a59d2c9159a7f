//! Immutable view of a secret collection at a point in time

use std::sync::Arc;

use super::secret::Secret;

/// Snapshot of the store's collection
///
/// `secrets` is `None` while the collection is uninitialized, which is
/// distinct from an initialized but empty collection. `revision` increases on
/// every change, so two snapshots with the same revision hold the same data.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    pub revision: u64,
    pub secrets: Option<Arc<Vec<Secret>>>,
}

impl CollectionSnapshot {
    /// Whether the collection has never been populated (or was reset)
    pub fn is_initial(&self) -> bool {
        self.secrets.is_none()
    }

    /// Secrets as a slice; `None` when uninitialized
    pub fn as_slice(&self) -> Option<&[Secret]> {
        self.secrets.as_deref().map(Vec::as_slice)
    }

    /// Number of secrets (0 when uninitialized)
    pub fn len(&self) -> usize {
        self.secrets.as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
