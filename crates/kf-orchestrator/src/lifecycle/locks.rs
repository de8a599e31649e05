//! Per-cluster serialization of lifecycle runs

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use kf_core::ClusterKey;

/// One async mutex per (provider, name, region)
///
/// A lifecycle run holds its cluster's lock from workspace preparation until
/// its last step finishes, so a delete issued while a create is running
/// waits for the create to settle instead of racing it on the workspace.
#[derive(Clone, Default)]
pub struct ClusterLocks {
    locks: Arc<DashMap<ClusterKey, Arc<Mutex<()>>>>,
}

impl ClusterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &ClusterKey) -> OwnedMutexGuard<()> {
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        mutex.lock_owned().await
    }

    /// Whether a run currently holds the lock for `key`
    pub fn is_locked(&self, key: &ClusterKey) -> bool {
        self.locks
            .get(key)
            .map(|mutex| mutex.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Drop the entry for `key` unless someone is holding or waiting on it
    pub fn release(&self, key: &ClusterKey) {
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_core::CloudProvider;
    use std::time::Duration;

    fn key(name: &str) -> ClusterKey {
        ClusterKey::new(CloudProvider::Aws, name, "us-west-1")
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = ClusterLocks::new();
        let guard = locks.lock(&key("demo")).await;
        assert!(locks.is_locked(&key("demo")));

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&key("demo")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(!locks.is_locked(&key("demo")));
    }

    #[tokio::test]
    async fn test_different_keys_are_independent() {
        let locks = ClusterLocks::new();
        let _a = locks.lock(&key("a")).await;
        let _b = locks.lock(&key("b")).await;
        assert!(locks.is_locked(&key("a")));
        assert!(locks.is_locked(&key("b")));
    }

    #[tokio::test]
    async fn test_release_keeps_held_locks() {
        let locks = ClusterLocks::new();
        let guard = locks.lock(&key("demo")).await;
        locks.release(&key("demo"));
        assert!(locks.is_locked(&key("demo")));

        drop(guard);
        locks.release(&key("demo"));
        assert!(!locks.is_locked(&key("demo")));
    }
}
