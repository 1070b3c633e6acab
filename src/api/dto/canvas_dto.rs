//! Canvas read DTOs: full grid, cooldown status, pixel provenance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Cell, Color, GridView};

/// Response body for `GET /canvas`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CanvasResponse {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Row-major colors, `grid[y][x]`; `null` is background.
    #[schema(value_type = Vec<Vec<Option<String>>>)]
    pub grid: Vec<Vec<Option<Color>>>,
    /// All-time count of successful placements.
    pub total_pixels: u64,
    /// Distinct users that ever placed a pixel.
    pub unique_users: u64,
    /// Time of the last successful placement.
    pub last_updated: DateTime<Utc>,
    /// Side length of the canvas (the larger dimension).
    pub canvas_size: u32,
}

impl From<GridView> for CanvasResponse {
    fn from(view: GridView) -> Self {
        Self {
            canvas_size: view.width.max(view.height),
            width: view.width,
            height: view.height,
            grid: view.grid,
            total_pixels: view.total_pixels,
            unique_users: view.unique_users,
            last_updated: view.last_updated,
        }
    }
}

impl From<CanvasResponse> for GridView {
    fn from(response: CanvasResponse) -> Self {
        Self {
            width: response.width,
            height: response.height,
            grid: response.grid,
            total_pixels: response.total_pixels,
            unique_users: response.unique_users,
            last_updated: response.last_updated,
        }
    }
}

/// Query string of `GET /canvas/cooldown`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CooldownQuery {
    /// User to look up.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response body for `GET /canvas/pixels/{x}/{y}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PixelResponse {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Current color and who placed it.
    #[serde(flatten)]
    pub cell: Cell,
}
