//! Bounded in-memory buffer of captured entries
//!
//! Provides a thread-safe ring buffer that keeps the most recent entries in
//! capture order.

use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::entry::LogEntry;

/// Default number of entries retained
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Thread-safe ring buffer for captured entries
pub struct CaptureBuffer {
    /// Entries in capture order (capped at capacity)
    entries: RwLock<VecDeque<LogEntry>>,
    /// Maximum entries to keep
    capacity: usize,
}

impl CaptureBuffer {
    /// Create a buffer holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest ones while over capacity
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.write();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Copy of all entries, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.read().iter().cloned().collect()
    }

    /// Get the number of entries in the buffer
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<LogEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<LogEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Maximum number of entries retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.write().clear();
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
