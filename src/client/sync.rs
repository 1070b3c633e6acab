//! Polling loop keeping a [`CanvasSession`] in step with the server.
//!
//! Three timers drive the loop: a grid refresh, a cooldown poll and a
//! one-second countdown tick. The grid is replaced wholesale on every
//! refresh. A failed fetch is logged by the session and the loop simply
//! waits for the next interval.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use super::countdown::TickOutcome;
use super::session::CanvasSession;

/// Timer periods of the [`SyncLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Between full grid fetches.
    pub grid_interval: Duration,
    /// Between cooldown polls.
    pub cooldown_interval: Duration,
    /// Local countdown resolution.
    pub tick: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            grid_interval: Duration::from_secs(5),
            cooldown_interval: Duration::from_secs(5),
            tick: Duration::from_secs(1),
        }
    }
}

/// Background refresher for one session.
#[derive(Debug, Clone)]
pub struct SyncLoop {
    session: Arc<CanvasSession>,
    config: SyncConfig,
}

fn interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

impl SyncLoop {
    /// Creates a loop for `session`.
    #[must_use]
    pub fn new(session: Arc<CanvasSession>, config: SyncConfig) -> Self {
        Self { session, config }
    }

    /// Fetches once, then keeps refreshing until `shutdown` completes.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        self.session.refresh_grid().await;
        self.session.refresh_cooldown().await;

        let mut grid = interval(self.config.grid_interval);
        let mut cooldown = interval(self.config.cooldown_interval);
        let mut tick = interval(self.config.tick);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = grid.tick() => {
                    self.session.refresh_grid().await;
                }
                _ = cooldown.tick() => {
                    self.session.refresh_cooldown().await;
                }
                _ = tick.tick() => {
                    if self.session.tick().await == TickOutcome::Expired {
                        self.session.refresh_cooldown().await;
                    }
                }
            }
        }
        tracing::debug!("sync loop stopped");
    }
}
