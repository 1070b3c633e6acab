//! Immutable log entries for successful placements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Color, UserId};

/// One successful placement, appended to the log and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    /// Column of the painted cell.
    pub x: u32,
    /// Row of the painted cell.
    pub y: u32,
    /// Color as submitted.
    pub color: Color,
    /// User who placed the pixel.
    pub user_id: UserId,
    /// Display name snapshot at placement time.
    pub username: String,
    /// Server timestamp of the placement.
    pub timestamp: DateTime<Utc>,
}
