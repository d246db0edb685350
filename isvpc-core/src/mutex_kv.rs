//! Keyed mutex
//!
//! Serializes operations that mutate the same parent object, e.g. two rules
//! being added to one security group. Each key gets its own async mutex,
//! created on first use and dropped once nobody holds or waits for it.
//! Holding the returned guard holds the key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;

type KeyMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Registry of per-key async mutexes
#[derive(Debug, Default, Clone)]
pub struct MutexKv {
    locks: Arc<Mutex<KeyMap>>,
}

/// Held lock on one key; released on drop
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<Mutex<KeyMap>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        let mut locks = lock_map(&self.locks);
        // Released under the map lock; waiters register under it too
        drop(self.guard.take());
        // Only the map's reference left
        if locks
            .get(&self.key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(&self.key);
        }
        log::trace!("unlocked {}", self.key);
    }
}

impl MutexKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock on `key`
    pub async fn lock(&self, key: impl Into<String>) -> KeyGuard {
        let key = key.into();
        let mutex = self.get(&key);
        log::trace!("locking {}", key);
        let guard = mutex.lock_owned().await;
        log::trace!("locked {}", key);
        KeyGuard {
            key,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// Number of keys currently held or waited on
    pub fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        lock_map(&self.locks)
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

// A poisoned map still holds valid mutexes
fn lock_map(locks: &Mutex<KeyMap>) -> MutexGuard<'_, KeyMap> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Lock key for subnet creation in one VPC zone
pub fn subnet_key(vpc: &str, zone: &str) -> String {
    format!("subnet_key_{}_{}", vpc, zone)
}

/// Lock key for rule writes on one security group
pub fn security_group_rule_key(security_group: &str) -> String {
    format!("security_group_rule_key_{}", security_group)
}

/// Lock key for security group bindings on one target
pub fn security_group_target_key(target: &str) -> String {
    format!("security_group_key_{}", target)
}

/// Lock key for address prefix writes on one VPC
pub fn vpc_address_prefix_key(vpc: &str) -> String {
    format!("vpc_address_prefix_key_{}", vpc)
}
