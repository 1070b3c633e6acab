//! Screen color capture.
//!
//! Picking a color from the screen depends on the host platform. Callers
//! get a [`ColorPicker`] and must cope with [`PickUnavailable`]; placing
//! pixels never depends on it.

use futures_util::future::BoxFuture;

use crate::domain::Color;

/// Why no color was picked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PickUnavailable {
    /// The platform has no screen color capture.
    #[error("color picking is not supported here")]
    Unsupported,
    /// The user dismissed the picker.
    #[error("color picking was cancelled")]
    Cancelled,
}

/// Captures a color from anywhere on screen.
pub trait ColorPicker: Send + Sync + std::fmt::Debug {
    /// Waits for the user to pick a color.
    fn pick_color_from_screen(&self) -> BoxFuture<'_, Result<Color, PickUnavailable>>;
}

/// Picker for platforms without screen capture.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoColorPicker;

impl ColorPicker for NoColorPicker {
    fn pick_color_from_screen(&self) -> BoxFuture<'_, Result<Color, PickUnavailable>> {
        Box::pin(async { Err(PickUnavailable::Unsupported) })
    }
}
