use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Guard that releases a node lock when dropped
pub struct NodeLockGuard {
    manager: NodeLockManager,
    node_name: String,
}

impl NodeLockGuard {
    pub fn node_name(&self) -> &str {
        &self.node_name
    }
}

impl Drop for NodeLockGuard {
    fn drop(&mut self) {
        self.manager.release(&self.node_name);
        debug!("🔓 Released lock for node {} (guard dropped)", self.node_name);
    }
}

/// Keeps two operations from driving the same node at once
#[derive(Clone, Default)]
pub struct NodeLockManager {
    locks: Arc<Mutex<HashMap<String, Instant>>>,
}

impl NodeLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(NodeLockGuard)` if the node was free; `None` otherwise.
    pub fn try_lock(&self, node_name: &str) -> Option<NodeLockGuard> {
        let mut locks = self.locks.lock();

        use std::collections::hash_map::Entry;
        match locks.entry(node_name.to_string()) {
            Entry::Occupied(entry) => {
                debug!(
                    "🔒 Node {} is already locked (locked for {:?})",
                    node_name,
                    entry.get().elapsed()
                );
                None
            }
            Entry::Vacant(entry) => {
                entry.insert(Instant::now());
                debug!("🔒 Acquired lock for node {}", node_name);
                Some(NodeLockGuard {
                    manager: self.clone(),
                    node_name: node_name.to_string(),
                })
            }
        }
    }

    fn release(&self, node_name: &str) {
        if self.locks.lock().remove(node_name).is_none() {
            trace!("Attempted to release non-existent lock for node {}", node_name);
        }
    }

    pub fn is_locked(&self, node_name: &str) -> bool {
        self.locks.lock().contains_key(node_name)
    }

    pub fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_lock_manager() {
        let manager = NodeLockManager::new();

        let guard1 = manager.try_lock("alice");
        assert!(guard1.is_some());
        assert!(manager.is_locked("alice"));

        // Same node again
        assert!(manager.try_lock("alice").is_none());

        // Different node
        let guard2 = manager.try_lock("bob");
        assert!(guard2.is_some());
        assert_eq!(manager.lock_count(), 2);

        drop(guard1);
        assert!(!manager.is_locked("alice"));
        let guard3 = manager.try_lock("alice");
        assert_eq!(guard3.as_ref().map(|g| g.node_name()), Some("alice"));
    }

    #[test]
    fn test_clones_share_locks() {
        let manager = NodeLockManager::new();
        let other = manager.clone();
        let _guard = manager.try_lock("cassandra").unwrap();
        assert!(other.try_lock("cassandra").is_none());
    }
}
