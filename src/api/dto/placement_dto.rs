//! Placement DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::PlacementRecord;
use crate::error::PlacementError;

/// Message returned with every successful placement.
pub const PLACED_MESSAGE: &str = "Pixel placed successfully!";

/// Request body for `POST /canvas/place`.
///
/// `userId` and `username` carry the caller's session identity; when
/// either is missing or blank the request is treated as unauthenticated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequest {
    /// Column (signed so negative input reports out of bounds).
    pub x: i64,
    /// Row.
    pub y: i64,
    /// `#RRGGBB` color.
    pub color: String,
    /// Session user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Session display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Response body for a successful placement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuccessResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
    /// The stored placement.
    pub pixel: PlacementRecord,
}

impl From<PlacementRecord> for PlaceSuccessResponse {
    fn from(pixel: PlacementRecord) -> Self {
        Self {
            success: true,
            message: PLACED_MESSAGE.to_string(),
            pixel,
        }
    }
}

/// Response body for a rejected placement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceFailureResponse {
    /// Always `false`.
    pub success: bool,
    /// Human-readable reason.
    pub message: String,
    /// `unauthenticated`, `on_cooldown`, `out_of_bounds` or `invalid_color`.
    pub error_kind: String,
    /// Seconds left, for `on_cooldown` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_cooldown: Option<u64>,
}

impl From<&PlacementError> for PlaceFailureResponse {
    fn from(err: &PlacementError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            error_kind: err.kind().to_string(),
            remaining_cooldown: err.remaining_cooldown(),
        }
    }
}
