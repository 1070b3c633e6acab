//! The grid store: cell colors, per-cell provenance, placement log and
//! aggregate stats.
//!
//! [`Grid`] is a plain owned structure. It is shared behind a
//! [`tokio::sync::RwLock`] by the placement service, which is the only
//! component allowed to call its mutating methods.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Color, PlacementRecord, UserId};
use crate::error::PlacementError;

/// Largest number of cells a canvas may have (4096 × 4096).
pub const MAX_CELLS: u64 = 4096 * 4096;

/// A stored or configured canvas size that no grid can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid canvas dimensions {width}x{height} (need 1..={max} cells)", max = MAX_CELLS)]
pub struct InvalidDimensions {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
}

/// Provenance of a painted cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Current color of the cell.
    pub color: Color,
    /// User who last painted the cell.
    pub placed_by: UserId,
    /// Display name of that user at placement time.
    pub placed_by_name: String,
    /// When the cell was last painted.
    pub placed_at: DateTime<Utc>,
}

/// Read-only copy of the full grid plus aggregate stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Row-major colors, `grid[y][x]`; `None` is background.
    pub grid: Vec<Vec<Option<Color>>>,
    /// All-time count of successful placements.
    pub total_pixels: u64,
    /// Count of distinct users that ever placed a pixel.
    pub unique_users: u64,
    /// Time of the last successful placement (or creation).
    pub last_updated: DateTime<Utc>,
}

impl GridView {
    /// Returns the color at `(x, y)`, or `None` for background or out of range.
    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Option<&Color> {
        self.grid
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .and_then(Option::as_ref)
    }

    /// Number of cells that currently hold a color.
    #[must_use]
    pub fn painted_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|c| c.is_some()).count()
    }
}

/// Aggregate counters of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CanvasStats {
    /// All-time count of successful placements.
    pub total_pixels: u64,
    /// Count of distinct users that ever placed a pixel.
    pub unique_users: u64,
    /// Time of the last successful placement (or creation).
    pub last_updated: DateTime<Utc>,
}

/// A painted cell with its coordinates, used by [`GridDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedCell {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Cell provenance.
    #[serde(flatten)]
    pub cell: Cell,
}

/// Serializable form of the whole grid store.
///
/// Cells are stored sparsely: only painted cells are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDocument {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Painted cells.
    pub cells: Vec<PlacedCell>,
    /// Retained placement log, oldest first.
    pub log: Vec<PlacementRecord>,
    /// Every user that ever placed a pixel.
    pub users: Vec<UserId>,
    /// All-time placement count.
    pub total_pixels: u64,
    /// Time of the last successful placement.
    pub last_updated: DateTime<Utc>,
}

/// Fixed-size color grid with provenance, log and stats.
///
/// The distinct-user set and the placement counter are maintained apart
/// from the log, so trimming the log to `log_capacity` never changes
/// `total_pixels` or `unique_users`.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Option<Cell>>,
    log: VecDeque<PlacementRecord>,
    log_capacity: usize,
    users: BTreeSet<UserId>,
    total_pixels: u64,
    last_updated: DateTime<Utc>,
}

impl Grid {
    /// Creates an empty grid. `log_capacity == 0` keeps the whole log.
    #[must_use]
    pub fn new(width: u32, height: u32, log_capacity: usize) -> Self {
        let len = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            cells: vec![None; len],
            log: VecDeque::new(),
            log_capacity,
            users: BTreeSet::new(),
            total_pixels: 0,
            last_updated: Utc::now(),
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// All-time count of successful placements.
    #[must_use]
    pub const fn total_pixels(&self) -> u64 {
        self.total_pixels
    }

    /// Count of distinct users that ever placed a pixel.
    #[must_use]
    pub fn unique_users(&self) -> u64 {
        self.users.len() as u64
    }

    /// Time of the last successful placement.
    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Maximum retained log records (0 = unbounded).
    #[must_use]
    pub const fn log_capacity(&self) -> usize {
        self.log_capacity
    }

    /// Current aggregate counters.
    #[must_use]
    pub fn stats(&self) -> CanvasStats {
        CanvasStats {
            total_pixels: self.total_pixels,
            unique_users: self.unique_users(),
            last_updated: self.last_updated,
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Checks coordinates then color, without touching the grid.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::OutOfBounds`] when `(x, y)` is outside
    /// `[0, width) × [0, height)`, else [`PlacementError::InvalidColor`]
    /// when `color` is not `#RRGGBB`.
    pub fn validate(&self, x: i64, y: i64, color: &str) -> Result<(u32, u32, Color), PlacementError> {
        let in_range = |v: i64, limit: u32| u32::try_from(v).ok().filter(|v| *v < limit);
        let (Some(cx), Some(cy)) = (in_range(x, self.width), in_range(y, self.height)) else {
            return Err(PlacementError::OutOfBounds { x, y });
        };
        let color = Color::parse(color)?;
        Ok((cx, cy, color))
    }

    /// Validates and applies one placement.
    ///
    /// Overwrites the target cell (last write wins), appends a
    /// [`PlacementRecord`] and updates the stats.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::OutOfBounds`] or
    /// [`PlacementError::InvalidColor`]; the grid is unchanged on error.
    pub fn apply_placement(
        &mut self,
        x: i64,
        y: i64,
        color: &str,
        user_id: &UserId,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<PlacementRecord, PlacementError> {
        let (x, y, color) = self.validate(x, y, color)?;
        let idx = self.index(x, y);
        let Some(slot) = self.cells.get_mut(idx) else {
            return Err(PlacementError::OutOfBounds {
                x: i64::from(x),
                y: i64::from(y),
            });
        };
        *slot = Some(Cell {
            color: color.clone(),
            placed_by: user_id.clone(),
            placed_by_name: username.to_string(),
            placed_at: now,
        });

        let record = PlacementRecord {
            x,
            y,
            color,
            user_id: user_id.clone(),
            username: username.to_string(),
            timestamp: now,
        };
        self.push_log(record.clone());
        self.users.insert(user_id.clone());
        self.total_pixels = self.total_pixels.saturating_add(1);
        self.last_updated = now;
        Ok(record)
    }

    fn push_log(&mut self, record: PlacementRecord) {
        self.log.push_back(record);
        if self.log_capacity > 0 {
            while self.log.len() > self.log_capacity {
                self.log.pop_front();
            }
        }
    }

    /// Returns the provenance of `(x, y)`, if the cell was ever painted.
    #[must_use]
    pub fn cell(&self, x: u32, y: u32) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(self.index(x, y)).and_then(Option::as_ref)
    }

    /// Returns the full matrix and stats.
    #[must_use]
    pub fn get_grid(&self) -> GridView {
        let grid = self
            .cells
            .chunks(self.width.max(1) as usize)
            .take(self.height as usize)
            .map(|row| row.iter().map(|c| c.as_ref().map(|c| c.color.clone())).collect())
            .collect();
        GridView {
            width: self.width,
            height: self.height,
            grid,
            total_pixels: self.total_pixels,
            unique_users: self.unique_users(),
            last_updated: self.last_updated,
        }
    }

    /// Returns up to `limit` most recent placements, newest first.
    #[must_use]
    pub fn recent_placements(&self, limit: usize) -> Vec<PlacementRecord> {
        self.log.iter().rev().take(limit).cloned().collect()
    }

    /// Number of records currently retained in the log.
    #[must_use]
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Serializes the whole store.
    #[must_use]
    pub fn to_document(&self) -> GridDocument {
        let width = self.width.max(1) as usize;
        let cells = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| {
                let cell = cell.as_ref()?;
                Some(PlacedCell {
                    x: u32::try_from(idx % width).ok()?,
                    y: u32::try_from(idx / width).ok()?,
                    cell: cell.clone(),
                })
            })
            .collect();
        GridDocument {
            width: self.width,
            height: self.height,
            cells,
            log: self.log.iter().cloned().collect(),
            users: self.users.iter().cloned().collect(),
            total_pixels: self.total_pixels,
            last_updated: self.last_updated,
        }
    }

    /// Whether a `width × height` grid is allowed.
    #[must_use]
    pub const fn dimensions_valid(width: u32, height: u32) -> bool {
        width > 0 && height > 0 && (width as u64) * (height as u64) <= MAX_CELLS
    }

    /// Rebuilds a store from its serialized form.
    ///
    /// Cells outside the stored dimensions are dropped. Users referenced by
    /// the log but missing from the user set are added back, so the stats
    /// never shrink below what the log proves.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDimensions`] if the stored size is empty or larger
    /// than [`MAX_CELLS`]; nothing is allocated in that case.
    pub fn from_document(doc: GridDocument, log_capacity: usize) -> Result<Self, InvalidDimensions> {
        if !Self::dimensions_valid(doc.width, doc.height) {
            return Err(InvalidDimensions {
                width: doc.width,
                height: doc.height,
            });
        }
        let mut grid = Self::new(doc.width, doc.height, log_capacity);
        for placed in doc.cells {
            if placed.x < grid.width && placed.y < grid.height {
                let idx = grid.index(placed.x, placed.y);
                if let Some(slot) = grid.cells.get_mut(idx) {
                    *slot = Some(placed.cell);
                }
            }
        }
        grid.users = doc.users.into_iter().collect();
        for record in doc.log {
            grid.users.insert(record.user_id.clone());
            grid.push_log(record);
        }
        grid.total_pixels = doc.total_pixels.max(grid.log.len() as u64);
        grid.last_updated = doc.last_updated;
        Ok(grid)
    }
}
