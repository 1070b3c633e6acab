//! Snapshot DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Snapshot;

/// Response body for `GET /canvas/snapshot`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    /// Snapshot to display, if any exists.
    pub snapshot: Option<Snapshot>,
    /// Which week is shown, or why nothing is.
    pub message: String,
}

/// Response body for `GET /canvas/snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotListResponse {
    /// Stored periods (`YYYY-Www`), oldest first.
    pub periods: Vec<String>,
}

/// Response body for `POST /canvas/snapshot/trigger`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    /// Whether this call wrote a new snapshot.
    pub created: bool,
    /// Period the snapshot belongs to.
    pub period: String,
    /// Human-readable outcome.
    pub message: String,
}
