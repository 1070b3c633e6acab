//! Local cooldown countdown, reconciled against the server.
//!
//! The client ticks its own estimate once a second so the UI can show a
//! live countdown, but the server is authoritative: every
//! [`CooldownCountdown::reconcile`] overwrites the estimate.

use crate::domain::CooldownStatus;

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No countdown is running.
    Idle,
    /// Seconds still left after this tick.
    Running(u64),
    /// The countdown just reached zero; the server should be asked again.
    Expired,
}

/// Seconds until the user may place again, as estimated locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownCountdown {
    remaining: u64,
}

impl CooldownCountdown {
    /// A stopped countdown.
    #[must_use]
    pub const fn new() -> Self {
        Self { remaining: 0 }
    }

    /// Starts (or restarts) from `seconds`.
    pub fn start(&mut self, seconds: u64) {
        self.remaining = seconds;
    }

    /// Seconds left.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Whether the user must still wait.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.remaining > 0
    }

    /// Advances by one second.
    pub fn tick(&mut self) -> TickOutcome {
        match self.remaining {
            0 => TickOutcome::Idle,
            1 => {
                self.remaining = 0;
                TickOutcome::Expired
            }
            n => {
                self.remaining = n - 1;
                TickOutcome::Running(self.remaining)
            }
        }
    }

    /// Replaces the estimate with the server's answer.
    pub fn reconcile(&mut self, status: CooldownStatus) {
        self.remaining = if status.on_cooldown {
            status.remaining_seconds
        } else {
            0
        };
    }
}
