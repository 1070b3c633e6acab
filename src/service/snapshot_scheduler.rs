//! Weekly archival of the canvas.
//!
//! The scheduler wakes up periodically, asks whether the current
//! [`SnapshotPeriod`] already has a snapshot and, if not, captures the
//! grid. Writes go through [`CanvasStore::insert_snapshot_if_absent`] and a
//! local mutex, so overlapping ticks or a manual trigger racing the timer
//! still produce one snapshot per period.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};

use super::PlacementService;
use crate::domain::{GridView, Snapshot, SnapshotPeriod};
use crate::error::CanvasError;
use crate::persistence::CanvasStore;

/// Captures at most one snapshot per ISO week.
#[derive(Debug)]
pub struct SnapshotScheduler {
    service: Arc<PlacementService>,
    store: Arc<dyn CanvasStore>,
    written: Mutex<HashSet<SnapshotPeriod>>,
}

impl SnapshotScheduler {
    /// Creates a scheduler reading from `service` and writing to `store`.
    #[must_use]
    pub fn new(service: Arc<PlacementService>, store: Arc<dyn CanvasStore>) -> Self {
        Self {
            service,
            store,
            written: Mutex::new(HashSet::new()),
        }
    }

    /// Returns `true` iff the period containing `now` has no snapshot yet.
    ///
    /// A store read failure answers `true`: the subsequent write is
    /// idempotent, so trying is harmless.
    pub async fn should_snapshot(&self, now: DateTime<Utc>) -> bool {
        let period = SnapshotPeriod::containing(now);
        if self.written.lock().await.contains(&period) {
            return false;
        }
        match self.store.load_snapshot(period).await {
            Ok(Some(_)) => {
                self.written.lock().await.insert(period);
                false
            }
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(%period, error = %e, "could not check for existing snapshot");
                true
            }
        }
    }

    /// Stores `grid` as the snapshot of the period containing `now`.
    ///
    /// Returns `true` when a new snapshot was written, `false` when the
    /// period already had one.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SnapshotFailure`] if the store rejects the
    /// write.
    pub async fn take_snapshot(&self, grid: &GridView, now: DateTime<Utc>) -> Result<bool, CanvasError> {
        let period = SnapshotPeriod::containing(now);
        let mut written = self.written.lock().await;
        if written.contains(&period) {
            return Ok(false);
        }

        let snapshot = Snapshot::capture(grid, now);
        let created = self
            .store
            .insert_snapshot_if_absent(snapshot)
            .await
            .map_err(|e| CanvasError::SnapshotFailure(format!("{period}: {e}")))?;
        written.insert(period);

        if created {
            tracing::info!(
                %period,
                total_pixels = grid.total_pixels,
                unique_users = grid.unique_users,
                "snapshot created"
            );
        } else {
            tracing::debug!(%period, "snapshot already present");
        }
        Ok(created)
    }

    /// Snapshots the live grid if the current period needs it.
    ///
    /// Returns the period and whether a snapshot was written.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SnapshotFailure`] if the write fails.
    pub async fn snapshot_now(&self, now: DateTime<Utc>) -> Result<(SnapshotPeriod, bool), CanvasError> {
        let period = SnapshotPeriod::containing(now);
        if !self.should_snapshot(now).await {
            return Ok((period, false));
        }
        let grid = self.service.grid().await;
        let created = self.take_snapshot(&grid, now).await?;
        Ok((period, created))
    }

    /// One scheduler tick. Failures are logged and swallowed.
    pub async fn tick(&self, now: DateTime<Utc>) {
        if let Err(e) = self.snapshot_now(now).await {
            tracing::error!(error = %e, "scheduled snapshot failed");
        }
    }

    /// Runs the check loop until `shutdown` flips.
    pub async fn run(self: Arc<Self>, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(every_secs = every.as_secs(), "snapshot scheduler started");
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(Utc::now()).await,
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("snapshot scheduler stopped");
    }

    /// The snapshot to show visitors: last week's, else this week's.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PersistenceError`] on store failures.
    pub async fn latest_for_display(&self, now: DateTime<Utc>) -> Result<Option<Snapshot>, CanvasError> {
        let current = SnapshotPeriod::containing(now);
        if let Some(snapshot) = self.store.load_snapshot(current.previous()).await? {
            return Ok(Some(snapshot));
        }
        Ok(self.store.load_snapshot(current).await?)
    }

    /// Loads the snapshot of `period`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SnapshotNotFound`] if none exists, or
    /// [`CanvasError::PersistenceError`] on store failures.
    pub async fn snapshot(&self, period: SnapshotPeriod) -> Result<Snapshot, CanvasError> {
        self.store
            .load_snapshot(period)
            .await?
            .ok_or_else(|| CanvasError::SnapshotNotFound(period.to_string()))
    }

    /// Lists the stored periods in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PersistenceError`] on store failures.
    pub async fn periods(&self) -> Result<Vec<SnapshotPeriod>, CanvasError> {
        Ok(self.store.list_snapshot_periods().await?)
    }
}
