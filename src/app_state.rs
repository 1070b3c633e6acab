//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{PlacementService, SnapshotScheduler};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Placement service: the grid, cooldowns and stats.
    pub placement_service: Arc<PlacementService>,
    /// Weekly snapshot archive.
    pub snapshot_scheduler: Arc<SnapshotScheduler>,
    /// Bearer token accepted by the manual snapshot trigger.
    pub cron_secret: Option<Arc<str>>,
}
