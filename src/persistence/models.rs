//! Stored document shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CooldownEntry, GridDocument};

/// Everything needed to restore the live canvas after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDocument {
    /// Grid cells, log and stats.
    pub grid: GridDocument,
    /// Last placement time per user.
    pub cooldowns: Vec<CooldownEntry>,
    /// When the document was written.
    pub saved_at: DateTime<Utc>,
}
