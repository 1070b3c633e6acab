//! Placement service: the single write path into the canvas.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::UserLocks;
use crate::domain::{
    CanvasStats, Cell, CooldownGate, CooldownStatus, Grid, GridView, Identity, PlacementRecord,
    UserId,
};
use crate::error::PlacementError;
use crate::persistence::{CanvasDocument, CanvasStore, StoreError};

/// Orchestration layer for all canvas reads and writes.
///
/// Owns the [`Grid`] and the [`CooldownGate`]. Every placement follows the
/// pattern: check identity → lock user → check cooldown → write grid →
/// record cooldown → mark dirty. No other component mutates the grid.
#[derive(Debug)]
pub struct PlacementService {
    grid: RwLock<Grid>,
    cooldowns: RwLock<CooldownGate>,
    user_locks: UserLocks,
    dirty: AtomicBool,
}

impl PlacementService {
    /// Creates a service over an empty `width × height` grid.
    #[must_use]
    pub fn new(width: u32, height: u32, cooldown: Duration, log_capacity: usize) -> Self {
        Self::from_parts(
            Grid::new(width, height, log_capacity),
            CooldownGate::new(cooldown),
        )
    }

    fn from_parts(grid: Grid, cooldowns: CooldownGate) -> Self {
        Self {
            grid: RwLock::new(grid),
            cooldowns: RwLock::new(cooldowns),
            user_locks: UserLocks::new(),
            dirty: AtomicBool::new(false),
        }
    }

    /// Rebuilds a service from a persisted document.
    ///
    /// The stored dimensions win over the configured ones: the grid is
    /// never resized once created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocument`] if the stored size is not a
    /// valid grid.
    pub fn from_document(
        document: CanvasDocument,
        cooldown: Duration,
        log_capacity: usize,
    ) -> Result<Self, StoreError> {
        let grid = Grid::from_document(document.grid, log_capacity)?;
        let mut gate = CooldownGate::new(cooldown);
        gate.restore(document.cooldowns);
        Ok(Self::from_parts(grid, gate))
    }

    /// Loads the canvas from `store`, or starts an empty one.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read or holds a
    /// canvas with invalid dimensions.
    pub async fn load_or_new(
        store: &dyn CanvasStore,
        width: u32,
        height: u32,
        cooldown: Duration,
        log_capacity: usize,
    ) -> Result<Self, StoreError> {
        match store.load_canvas().await? {
            Some(document) => {
                if document.grid.width != width || document.grid.height != height {
                    tracing::warn!(
                        stored_width = document.grid.width,
                        stored_height = document.grid.height,
                        width,
                        height,
                        "configured canvas size differs from stored canvas; keeping stored size"
                    );
                }
                let service = Self::from_document(document, cooldown, log_capacity)?;
                tracing::info!(
                    total_pixels = service.grid.read().await.total_pixels(),
                    "canvas restored from store"
                );
                Ok(service)
            }
            None => {
                tracing::info!(width, height, "starting empty canvas");
                Ok(Self::new(width, height, cooldown, log_capacity))
            }
        }
    }

    /// Places a pixel at the current time.
    ///
    /// # Errors
    ///
    /// See [`PlacementService::place_at`].
    pub async fn place(
        &self,
        identity: Option<&Identity>,
        x: i64,
        y: i64,
        color: &str,
    ) -> Result<PlacementRecord, PlacementError> {
        self.place_at(identity, x, y, color, Utc::now()).await
    }

    /// Places a pixel as of `now`.
    ///
    /// Checks run in order and short-circuit: identity, cooldown,
    /// coordinates, color. The cooldown is recorded only after the grid
    /// write succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::Unauthenticated`],
    /// [`PlacementError::OnCooldown`], [`PlacementError::OutOfBounds`] or
    /// [`PlacementError::InvalidColor`]. Nothing is mutated on error.
    pub async fn place_at(
        &self,
        identity: Option<&Identity>,
        x: i64,
        y: i64,
        color: &str,
        now: DateTime<Utc>,
    ) -> Result<PlacementRecord, PlacementError> {
        let Some(identity) = identity else {
            tracing::debug!(x, y, "placement rejected: unauthenticated");
            return Err(PlacementError::Unauthenticated);
        };
        let _user_guard = self.user_locks.acquire(&identity.id).await;

        let status = self.cooldowns.read().await.check_cooldown(&identity.id, now);
        if status.on_cooldown {
            tracing::debug!(
                user_id = %identity.id,
                remaining_seconds = status.remaining_seconds,
                "placement rejected: on cooldown"
            );
            return Err(PlacementError::OnCooldown {
                remaining_seconds: status.remaining_seconds,
            });
        }

        let record = {
            let mut grid = self.grid.write().await;
            grid.apply_placement(x, y, color, &identity.id, &identity.username, now)?
        };

        self.cooldowns
            .write()
            .await
            .record_placement(&identity.id, now);
        self.dirty.store(true, Ordering::Release);

        tracing::info!(
            user_id = %identity.id,
            x = record.x,
            y = record.y,
            color = %record.color,
            "pixel placed"
        );
        Ok(record)
    }

    /// Returns the full grid and stats.
    pub async fn grid(&self) -> GridView {
        self.grid.read().await.get_grid()
    }

    /// Returns the aggregate counters without copying the matrix.
    pub async fn stats(&self) -> CanvasStats {
        self.grid.read().await.stats()
    }

    /// Returns the provenance of a painted cell.
    pub async fn cell(&self, x: u32, y: u32) -> Option<Cell> {
        self.grid.read().await.cell(x, y).cloned()
    }

    /// Returns up to `limit` most recent placements, newest first.
    pub async fn recent_placements(&self, limit: usize) -> Vec<PlacementRecord> {
        self.grid.read().await.recent_placements(limit)
    }

    /// Returns the cooldown status of `user_id` at the current time.
    pub async fn cooldown_status(&self, user_id: &UserId) -> CooldownStatus {
        self.cooldown_status_at(user_id, Utc::now()).await
    }

    /// Returns the cooldown status of `user_id` as of `now`.
    pub async fn cooldown_status_at(&self, user_id: &UserId, now: DateTime<Utc>) -> CooldownStatus {
        self.cooldowns.read().await.check_cooldown(user_id, now)
    }

    /// The configured cooldown interval.
    pub async fn cooldown_interval(&self) -> Duration {
        self.cooldowns.read().await.interval()
    }

    /// Whether state changed since the last successful flush.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Captures the whole canvas for persistence.
    pub async fn document(&self) -> CanvasDocument {
        let grid = self.grid.read().await.to_document();
        let cooldowns = self.cooldowns.read().await.entries();
        CanvasDocument {
            grid,
            cooldowns,
            saved_at: Utc::now(),
        }
    }

    /// Replaces the live canvas with a persisted document.
    ///
    /// The cooldown interval and log capacity stay as configured.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocument`] if the document's size is not
    /// a valid grid; the live canvas is left untouched.
    pub async fn restore(&self, document: CanvasDocument) -> Result<(), StoreError> {
        let mut grid = self.grid.write().await;
        let mut cooldowns = self.cooldowns.write().await;
        let capacity = grid.log_capacity();
        *grid = Grid::from_document(document.grid, capacity)?;
        cooldowns.restore(document.cooldowns);
        self.dirty.store(false, Ordering::Release);
        tracing::info!(total_pixels = grid.total_pixels(), "canvas restored");
        Ok(())
    }

    /// Writes the canvas to `store` if it changed since the last flush.
    ///
    /// Returns `true` when a write happened. On failure the canvas stays
    /// dirty so the next flush retries.
    ///
    /// # Errors
    ///
    /// Returns the store's [`StoreError`].
    pub async fn flush(&self, store: &dyn CanvasStore) -> Result<bool, StoreError> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }
        let document = self.document().await;
        if let Err(e) = store.save_canvas(document).await {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        Ok(true)
    }
}
