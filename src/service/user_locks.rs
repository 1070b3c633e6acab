//! Per-user mutexes serializing placement attempts.
//!
//! [`UserLocks`] keeps one [`tokio::sync::Mutex`] per user behind an outer
//! `RwLock<HashMap<...>>`. Holding a user's mutex across the
//! check-cooldown → write-grid → record-cooldown sequence means two
//! concurrent requests from the same user cannot both pass the gate,
//! while different users proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::UserId;

/// Registry of per-user placement locks.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: RwLock<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock of `user_id`, creating it on first use.
    pub async fn acquire(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(user_id).map(Arc::clone);
        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut map = self.locks.write().await;
                Arc::clone(map.entry(user_id.clone()).or_default())
            }
        };
        lock.lock_owned().await
    }

    /// Number of users that ever acquired a lock.
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Returns `true` if no lock was ever created.
    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let user = UserId::from("u1");

        let guard = locks.acquire(&user).await;
        let contender = {
            let locks = Arc::clone(&locks);
            let user = user.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(&user).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        assert!(contender.await.is_ok());
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire(&UserId::from("a")).await;
        let _b = locks.acquire(&UserId::from("b")).await;
        assert_eq!(locks.len().await, 2);
        assert!(!locks.is_empty().await);
    }
}
