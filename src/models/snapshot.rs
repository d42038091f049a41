use std::path::PathBuf;

use chrono::NaiveDateTime;

use super::item::Item;

// ---------------------------------------------------------------------------
// Snapshot: All listings captured at one point in time
// ---------------------------------------------------------------------------

/// An immutable capture of the full item listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Wall-clock capture time (second precision, local time).
    pub captured_at: NaiveDateTime,
    pub items: Vec<Item>,
    /// File the snapshot was written to or read from, if any.
    pub path: Option<PathBuf>,
}

impl Snapshot {
    pub fn new(captured_at: NaiveDateTime, items: Vec<Item>) -> Self {
        Self {
            captured_at,
            items,
            path: None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SavedSnapshot: Reference to a snapshot file on disk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SavedSnapshot {
    pub captured_at: NaiveDateTime,
    pub path: PathBuf,
}

impl SavedSnapshot {
    /// File name without directory, e.g. `items_20240101_120000.json`.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Human-readable label, e.g. `2024-01-01 12:00:00 (items_20240101_120000.json)`.
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.captured_at.format("%Y-%m-%d %H:%M:%S"),
            self.file_name()
        )
    }
}
