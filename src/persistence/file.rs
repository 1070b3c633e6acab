//! JSON-file store.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data>/pixel-canvas.json
//! <data>/canvas-snapshots/<period>.json
//! ```
//!
//! The canvas file is replaced atomically (write to a temp file, then
//! rename). A snapshot is written to a temp file and published with a hard
//! link, which fails if the period already has a file; a partial write is
//! never visible under the period's name. An existing file that does not
//! decode is replaced.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::BoxFuture;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{CanvasDocument, CanvasStore, StoreError, StoreResult};
use crate::domain::{Snapshot, SnapshotPeriod};

const CANVAS_FILE: &str = "pixel-canvas.json";
const SNAPSHOT_DIR: &str = "canvas-snapshots";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// [`CanvasStore`] backed by JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. Directories are created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn canvas_path(&self) -> PathBuf {
        self.root.join(CANVAS_FILE)
    }

    fn snapshot_dir(&self) -> PathBuf {
        self.root.join(SNAPSHOT_DIR)
    }

    fn snapshot_path(&self, period: SnapshotPeriod) -> PathBuf {
        self.snapshot_dir().join(format!("{period}.json"))
    }
}

async fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

async fn ensure_dir(path: &Path) -> StoreResult<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

impl FileStore {
    /// Keeps a readable snapshot in place; swaps in `tmp` over one that
    /// does not decode.
    async fn replace_if_unreadable(
        &self,
        tmp: &Path,
        path: &Path,
        period: SnapshotPeriod,
    ) -> StoreResult<bool> {
        match self.load_snapshot(period).await {
            Ok(Some(_)) => Ok(false),
            Ok(None) | Err(StoreError::Serde(_)) => {
                tracing::warn!(%period, path = %path.display(), "replacing unreadable snapshot file");
                fs::rename(tmp, path)
                    .await
                    .map_err(|e| StoreError::io(path, e))?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

impl CanvasStore for FileStore {
    fn load_canvas(&self) -> BoxFuture<'_, StoreResult<Option<CanvasDocument>>> {
        Box::pin(async move {
            let Some(bytes) = read_optional(&self.canvas_path()).await? else {
                return Ok(None);
            };
            Ok(Some(serde_json::from_slice(&bytes)?))
        })
    }

    fn save_canvas(&self, document: CanvasDocument) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            ensure_dir(&self.root).await?;
            let json = serde_json::to_vec_pretty(&document)?;
            let target = self.canvas_path();
            let tmp = target.with_extension("json.tmp");
            fs::write(&tmp, json)
                .await
                .map_err(|e| StoreError::io(&tmp, e))?;
            fs::rename(&tmp, &target)
                .await
                .map_err(|e| StoreError::io(&target, e))
        })
    }

    fn load_snapshot(
        &self,
        period: SnapshotPeriod,
    ) -> BoxFuture<'_, StoreResult<Option<Snapshot>>> {
        Box::pin(async move {
            let Some(bytes) = read_optional(&self.snapshot_path(period)).await? else {
                return Ok(None);
            };
            Ok(Some(serde_json::from_slice(&bytes)?))
        })
    }

    fn insert_snapshot_if_absent(&self, snapshot: Snapshot) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let dir = self.snapshot_dir();
            ensure_dir(&dir).await?;
            let path = self.snapshot_path(snapshot.period);
            let json = serde_json::to_vec_pretty(&snapshot)?;

            let tmp = dir.join(format!(
                ".{}.{}.{}.tmp",
                snapshot.period,
                std::process::id(),
                TMP_SEQ.fetch_add(1, Ordering::Relaxed)
            ));
            if let Err(e) = write_synced(&tmp, &json).await {
                let _ = fs::remove_file(&tmp).await;
                return Err(StoreError::io(&tmp, e));
            }

            let published = match fs::hard_link(&tmp, &path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    self.replace_if_unreadable(&tmp, &path, snapshot.period).await
                }
                Err(e) => Err(StoreError::io(&path, e)),
            };
            match fs::remove_file(&tmp).await {
                Err(e) if e.kind() != ErrorKind::NotFound => {
                    tracing::warn!(path = %tmp.display(), error = %e, "failed to remove temp snapshot");
                }
                _ => {}
            }
            published
        })
    }

    fn list_snapshot_periods(&self) -> BoxFuture<'_, StoreResult<Vec<SnapshotPeriod>>> {
        Box::pin(async move {
            let dir = self.snapshot_dir();
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(StoreError::io(&dir, e)),
            };
            let mut periods = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::io(&dir, e))?
            {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(period) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<SnapshotPeriod>().ok())
                {
                    periods.push(period);
                }
            }
            periods.sort_unstable();
            Ok(periods)
        })
    }
}
