//! Service layer: business logic orchestration.
//!
//! [`PlacementService`] is the only writer of the grid and cooldown state.
//! [`SnapshotScheduler`] archives the grid once per ISO week, and
//! [`run_persister`] flushes the live canvas behind the scenes.

pub mod persister;
pub mod placement_service;
pub mod snapshot_scheduler;
pub mod user_locks;

pub use persister::run_persister;
pub use placement_service::PlacementService;
pub use snapshot_scheduler::SnapshotScheduler;
pub use user_locks::UserLocks;
