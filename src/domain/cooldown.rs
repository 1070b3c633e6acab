//! Per-user cooldown gate.
//!
//! Each user is either idle or on cooldown. A user becomes on-cooldown
//! when [`CooldownGate::record_placement`] is called after a successful
//! grid write, and returns to idle once the interval has elapsed. A user
//! absent from the map is idle.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Result of a cooldown query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CooldownStatus {
    /// Whether the user must wait before placing again.
    pub on_cooldown: bool,
    /// Whole seconds left, rounded up; `0` when idle.
    pub remaining_seconds: u64,
}

impl CooldownStatus {
    /// Status of a user who may place right now.
    pub const IDLE: Self = Self {
        on_cooldown: false,
        remaining_seconds: 0,
    };
}

/// Persisted last-placement time of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownEntry {
    /// User the entry belongs to.
    pub user_id: UserId,
    /// Time of that user's last successful placement.
    pub last_placed_at: DateTime<Utc>,
}

/// Fixed-interval rate limiter keyed by user.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    interval: Duration,
    last_placement: HashMap<UserId, DateTime<Utc>>,
}

impl CooldownGate {
    /// Creates a gate enforcing `interval` between a user's placements.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_placement: HashMap::new(),
        }
    }

    /// The configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns whether `user_id` is on cooldown at `now`.
    ///
    /// Unknown users are idle. A last-placement time in the future (clock
    /// skew) counts as a placement made at `now`.
    #[must_use]
    pub fn check_cooldown(&self, user_id: &UserId, now: DateTime<Utc>) -> CooldownStatus {
        let Some(last) = self.last_placement.get(user_id) else {
            return CooldownStatus::IDLE;
        };
        let elapsed = (now - *last).to_std().unwrap_or(Duration::ZERO);
        match self.interval.checked_sub(elapsed) {
            Some(remaining) if !remaining.is_zero() => CooldownStatus {
                on_cooldown: true,
                remaining_seconds: ceil_secs(remaining),
            },
            _ => CooldownStatus::IDLE,
        }
    }

    /// Records a successful placement by `user_id` at `timestamp`.
    ///
    /// Must only be called after the grid write has succeeded.
    pub fn record_placement(&mut self, user_id: &UserId, timestamp: DateTime<Utc>) {
        self.last_placement.insert(user_id.clone(), timestamp);
    }

    /// Exports the map for persistence.
    #[must_use]
    pub fn entries(&self) -> Vec<CooldownEntry> {
        let mut entries: Vec<CooldownEntry> = self
            .last_placement
            .iter()
            .map(|(user_id, at)| CooldownEntry {
                user_id: user_id.clone(),
                last_placed_at: *at,
            })
            .collect();
        entries.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        entries
    }

    /// Replaces the map with persisted entries.
    pub fn restore(&mut self, entries: Vec<CooldownEntry>) {
        self.last_placement = entries
            .into_iter()
            .map(|e| (e.user_id, e.last_placed_at))
            .collect();
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn gate() -> CooldownGate {
        CooldownGate::new(Duration::from_secs(30))
    }

    #[test]
    fn unknown_user_is_idle() {
        let gate = gate();
        assert_eq!(
            gate.check_cooldown(&UserId::from("nobody"), Utc::now()),
            CooldownStatus::IDLE
        );
    }

    #[test]
    fn placement_starts_cooldown() {
        let mut gate = gate();
        let user = UserId::from("u1");
        let t0 = Utc::now();
        gate.record_placement(&user, t0);

        let status = gate.check_cooldown(&user, t0);
        assert!(status.on_cooldown);
        assert_eq!(status.remaining_seconds, 30);

        let status = gate.check_cooldown(&user, t0 + TimeDelta::milliseconds(10_500));
        assert!(status.on_cooldown);
        assert_eq!(status.remaining_seconds, 20);
    }

    #[test]
    fn cooldown_ends_after_interval() {
        let mut gate = gate();
        let user = UserId::from("u1");
        let t0 = Utc::now();
        gate.record_placement(&user, t0);
        assert_eq!(
            gate.check_cooldown(&user, t0 + TimeDelta::seconds(30)),
            CooldownStatus::IDLE
        );
        assert_eq!(
            gate.check_cooldown(&user, t0 + TimeDelta::seconds(31)),
            CooldownStatus::IDLE
        );
    }

    #[test]
    fn cooldown_is_per_user() {
        let mut gate = gate();
        let t0 = Utc::now();
        gate.record_placement(&UserId::from("u1"), t0);
        assert!(!gate.check_cooldown(&UserId::from("u2"), t0).on_cooldown);
    }

    #[test]
    fn future_timestamp_counts_as_now() {
        let mut gate = gate();
        let user = UserId::from("u1");
        let t0 = Utc::now();
        gate.record_placement(&user, t0 + TimeDelta::seconds(5));
        assert_eq!(gate.check_cooldown(&user, t0).remaining_seconds, 30);
    }

    #[test]
    fn entries_round_trip() {
        let mut gate = gate();
        let t0 = Utc::now();
        gate.record_placement(&UserId::from("b"), t0);
        gate.record_placement(&UserId::from("a"), t0);

        let entries = gate.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.first().map(|e| e.user_id.as_str()), Some("a"));

        let mut restored = CooldownGate::new(Duration::from_secs(30));
        restored.restore(entries);
        assert!(restored.check_cooldown(&UserId::from("b"), t0).on_cooldown);
    }
}
