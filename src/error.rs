//! Canvas error types with HTTP status code mapping.
//!
//! [`PlacementError`] is the user-facing taxonomy for a rejected placement.
//! [`CanvasError`] is the central server error type: each variant maps to
//! a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::persistence::StoreError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "snapshot not found: 2025-W38",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Reasons a placement can be rejected.
///
/// These are expected conditions, not bugs: each one is surfaced to the
/// user with its `Display` text and is never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// No authenticated identity was supplied.
    #[error("Please sign in to place pixels")]
    Unauthenticated,

    /// The user placed a pixel less than one cooldown interval ago.
    #[error("Please wait {remaining_seconds} more second(s) before placing another pixel")]
    OnCooldown {
        /// Whole seconds (rounded up) until the user may place again.
        remaining_seconds: u64,
    },

    /// The target cell lies outside the grid.
    #[error("Invalid coordinates ({x}, {y})")]
    OutOfBounds {
        /// Requested column.
        x: i64,
        /// Requested row.
        y: i64,
    },

    /// The submitted color is not a `#RRGGBB` hex value.
    #[error("Invalid color format: {0}")]
    InvalidColor(String),
}

impl PlacementError {
    /// Stable machine-readable discriminator used on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::OnCooldown { .. } => "on_cooldown",
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::InvalidColor(_) => "invalid_color",
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Unauthenticated => 4001,
            Self::OnCooldown { .. } => 4002,
            Self::OutOfBounds { .. } => 4003,
            Self::InvalidColor(_) => 4004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::OnCooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::OutOfBounds { .. } | Self::InvalidColor(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Remaining cooldown, when the rejection was a cooldown.
    #[must_use]
    pub const fn remaining_cooldown(&self) -> Option<u64> {
        match self {
            Self::OnCooldown { remaining_seconds } => Some(*remaining_seconds),
            _ => None,
        }
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation/Auth | 400 Bad Request / 401      |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Server          | 500 Internal Server Error  |
/// | 4000–4999 | Placement       | 400 / 401 / 429            |
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A placement was rejected.
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or wrong credentials on a privileged endpoint.
    #[error("unauthorized")]
    Unauthorized,

    /// No snapshot exists for the requested period.
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// The requested cell has never been painted.
    #[error("no pixel placed at ({x}, {y})")]
    PixelNotPlaced {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// A snapshot could not be rendered or stored.
    #[error("snapshot failure: {0}")]
    SnapshotFailure(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CanvasError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Placement(e) => e.error_code(),
            Self::InvalidRequest(_) => 1001,
            Self::Unauthorized => 1002,
            Self::SnapshotNotFound(_) => 2001,
            Self::PixelNotPlaced { .. } => 2002,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::SnapshotFailure(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Placement(e) => e.status_code(),
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::SnapshotNotFound(_) | Self::PixelNotPlaced { .. } => StatusCode::NOT_FOUND,
            Self::PersistenceError(_) | Self::SnapshotFailure(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for CanvasError {
    fn from(err: StoreError) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for CanvasError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_errors_map_to_distinct_statuses() {
        assert_eq!(
            PlacementError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PlacementError::OnCooldown {
                remaining_seconds: 3
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            PlacementError::OutOfBounds { x: -1, y: 0 }.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn cooldown_message_mentions_seconds() {
        let err = PlacementError::OnCooldown {
            remaining_seconds: 12,
        };
        assert!(err.to_string().contains("12 more second(s)"));
        assert_eq!(err.remaining_cooldown(), Some(12));
        assert_eq!(PlacementError::Unauthenticated.remaining_cooldown(), None);
    }

    #[test]
    fn canvas_error_wraps_placement_code() {
        let err = CanvasError::from(PlacementError::InvalidColor("red".to_string()));
        assert_eq!(err.error_code(), 4004);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_variants_are_404() {
        assert_eq!(
            CanvasError::SnapshotNotFound("2025-W01".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CanvasError::PixelNotPlaced { x: 1, y: 2 }.status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
