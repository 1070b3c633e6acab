//! In-memory store, used for tests and ephemeral deployments.

use std::collections::BTreeMap;

use futures_util::future::BoxFuture;
use tokio::sync::RwLock;

use super::{CanvasDocument, CanvasStore, StoreResult};
use crate::domain::{Snapshot, SnapshotPeriod};

/// Process-local [`CanvasStore`]. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    canvas: RwLock<Option<CanvasDocument>>,
    snapshots: RwLock<BTreeMap<SnapshotPeriod, Snapshot>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

impl CanvasStore for MemoryStore {
    fn load_canvas(&self) -> BoxFuture<'_, StoreResult<Option<CanvasDocument>>> {
        Box::pin(async move { Ok(self.canvas.read().await.clone()) })
    }

    fn save_canvas(&self, document: CanvasDocument) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            *self.canvas.write().await = Some(document);
            Ok(())
        })
    }

    fn load_snapshot(
        &self,
        period: SnapshotPeriod,
    ) -> BoxFuture<'_, StoreResult<Option<Snapshot>>> {
        Box::pin(async move { Ok(self.snapshots.read().await.get(&period).cloned()) })
    }

    fn insert_snapshot_if_absent(&self, snapshot: Snapshot) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let mut map = self.snapshots.write().await;
            if map.contains_key(&snapshot.period) {
                return Ok(false);
            }
            map.insert(snapshot.period, snapshot);
            Ok(true)
        })
    }

    fn list_snapshot_periods(&self) -> BoxFuture<'_, StoreResult<Vec<SnapshotPeriod>>> {
        Box::pin(async move { Ok(self.snapshots.read().await.keys().copied().collect()) })
    }
}
