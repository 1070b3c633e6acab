//! Client library: viewport math, server access, the placement session
//! and the polling sync loop.
//!
//! Rendering is left to the embedding UI. It feeds input events to the
//! [`ViewportController`], forwards resulting clicks to a
//! [`CanvasSession`] and draws whatever [`CanvasSession::view`] returns.

pub mod api;
pub mod countdown;
pub mod eyedropper;
pub mod notify;
pub mod session;
pub mod sync;
pub mod viewport;

pub use api::{CanvasApi, ClientError, HttpCanvasApi, LocalCanvasApi};
pub use countdown::{CooldownCountdown, TickOutcome};
pub use eyedropper::{ColorPicker, NoColorPicker, PickUnavailable};
pub use notify::{Notification, NotificationSink, RecordingSink, Severity, TracingSink};
pub use session::{CanvasSession, ClickOutcome};
pub use sync::{SyncConfig, SyncLoop};
pub use viewport::{
    CellCoord, ContainerRect, DeviceClass, Point, ViewportConfig, ViewportController,
    ViewportState,
};
