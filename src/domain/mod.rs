//! Domain layer: colors, identities, the grid store, the cooldown gate
//! and snapshot records.
//!
//! Everything here is plain owned data with synchronous methods. Sharing
//! and locking are the service layer's concern.

pub mod color;
pub mod cooldown;
pub mod grid;
pub mod identity;
pub mod placement;
pub mod snapshot;

pub use color::{Color, DEFAULT_PALETTE};
pub use cooldown::{CooldownEntry, CooldownGate, CooldownStatus};
pub use grid::{CanvasStats, Cell, Grid, GridDocument, GridView, InvalidDimensions, MAX_CELLS};
pub use identity::{Identity, UserId};
pub use placement::PlacementRecord;
pub use snapshot::{Snapshot, SnapshotPeriod};
