//! Per-artifact async locks.
//!
//! Artifact names are derived from upload names, so two requests for
//! `report.pdf` target the same output file. Holding the lock for a name
//! serializes them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct ArtifactLocks {
    locks: Arc<LockMap>,
}

impl ArtifactLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the artifact called `name`.
    pub async fn lock(&self, name: &str) -> ArtifactGuard {
        let mutex = self.locks.entry(name.to_string()).or_default().clone();
        let guard = mutex.lock_owned().await;
        ArtifactGuard {
            name: name.to_string(),
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of names with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one artifact name; released on drop.
#[derive(Debug)]
pub struct ArtifactGuard {
    name: String,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ArtifactGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        // Map entry + our guard: nobody else is waiting, so prune the entry.
        self.locks
            .remove_if(&self.name, |_, mutex| Arc::strong_count(mutex) <= 2);
        self.guard.take();
    }
}
