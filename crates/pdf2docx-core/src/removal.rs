//! Deferred, cancellable removal of converted artifacts.
//!
//! Each scheduled path owns one tokio task that sleeps for the configured
//! delay and then deletes the file. Tasks are keyed by path: scheduling a path
//! again cancels the earlier task, and a retrieval or bulk cleanup cancels
//! the task outright instead of racing it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct PendingRemoval {
    id: u64,
    cancel: CancellationToken,
}

/// Owns the pending removal tasks of one service instance.
#[derive(Debug, Clone, Default)]
pub struct RemovalScheduler {
    pending: Arc<DashMap<PathBuf, PendingRemoval>>,
    next_id: Arc<AtomicU64>,
}

impl RemovalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete `path` after `delay` unless cancelled first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, path: PathBuf, delay: Duration) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = tokio::time::Instant::now() + delay;
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        if let Some(previous) = self
            .pending
            .insert(path.clone(), PendingRemoval { id, cancel })
        {
            previous.cancel.cancel();
        }

        tracing::debug!(path = %path.display(), delay_secs = delay.as_secs(), "scheduled removal");

        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            tokio::select! {
                _ = task_cancel.cancelled() => {
                    tracing::debug!(path = %path.display(), "scheduled removal cancelled");
                }
                _ = tokio::time::sleep_until(deadline) => {
                    remove_expired(&path);
                }
            }
            // A newer task for the same path keeps its entry.
            pending.remove_if(&path, |_, entry| entry.id == id);
        });
    }

    /// Cancel the pending removal for `path`. Returns whether one existed.
    pub fn cancel(&self, path: &Path) -> bool {
        match self.pending.remove(path) {
            Some((_, entry)) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending removal. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        self.pending.retain(|_, entry| {
            entry.cancel.cancel();
            cancelled += 1;
            false
        });
        cancelled
    }

    /// Number of removals still waiting to fire.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_scheduled(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }
}

fn remove_expired(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "deleted after timeout"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "already gone at timeout");
        }
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "error deleting file"),
    }
}
