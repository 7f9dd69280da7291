//! Last-seen liberation state per planet.
//!
//! The tracker lives for the lifetime of the process and is owned by the
//! cycle runner. Entries are never evicted.

use crate::models::{SnapshotEntry, Trend};
use std::collections::HashMap;

/// In-memory map from planet name to its last featured observation.
#[derive(Debug, Default, Clone)]
pub struct SnapshotTracker {
    entries: HashMap<String, SnapshotEntry>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the last observation for a planet (exact, case-sensitive).
    pub fn lookup(&self, name: &str) -> Option<&SnapshotEntry> {
        self.entries.get(name)
    }

    /// Insert or overwrite the observation for a planet.
    pub fn upsert(&mut self, name: &str, progress_percent: f64, trend: Trend) {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.last_progress_percent = progress_percent;
                entry.last_trend = trend;
            }
            None => {
                self.entries.insert(
                    name.to_string(),
                    SnapshotEntry {
                        name: name.to_string(),
                        last_progress_percent: progress_percent,
                        last_trend: trend,
                    },
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
