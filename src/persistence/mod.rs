//! Persistence layer: durable storage for the canvas document and
//! weekly snapshots.
//!
//! [`CanvasStore`] is the key-addressed collaborator the service layer
//! talks to. Whole-object overwrite is the only update mode for the
//! canvas; snapshots are insert-if-absent so each period is written once.

pub mod file;
pub mod memory;
pub mod models;
pub mod postgres;

use std::path::PathBuf;

use futures_util::future::BoxFuture;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use models::CanvasDocument;
pub use postgres::PostgresStore;

use crate::domain::{InvalidDimensions, Snapshot, SnapshotPeriod};

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A stored canvas describes a grid that cannot exist.
    #[error("invalid stored canvas: {0}")]
    InvalidDocument(#[from] InvalidDimensions),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Abstraction over the durable storage of canvas state and snapshots.
pub trait CanvasStore: Send + Sync + std::fmt::Debug {
    /// Loads the persisted canvas, or `None` if nothing was saved yet.
    fn load_canvas(&self) -> BoxFuture<'_, StoreResult<Option<CanvasDocument>>>;

    /// Overwrites the persisted canvas.
    fn save_canvas(&self, document: CanvasDocument) -> BoxFuture<'_, StoreResult<()>>;

    /// Loads the snapshot of `period`, if any.
    fn load_snapshot(&self, period: SnapshotPeriod)
    -> BoxFuture<'_, StoreResult<Option<Snapshot>>>;

    /// Stores `snapshot` unless its period already has one.
    ///
    /// Returns `true` when this call wrote the snapshot.
    fn insert_snapshot_if_absent(&self, snapshot: Snapshot) -> BoxFuture<'_, StoreResult<bool>>;

    /// Lists stored periods in ascending order.
    fn list_snapshot_periods(&self) -> BoxFuture<'_, StoreResult<Vec<SnapshotPeriod>>>;
}
