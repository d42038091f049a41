//! Single-slot baseline repository.
//!
//! The baseline is the filtered set of the previous run. Each run reads it for
//! change detection and then replaces it wholesale; there is no history.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Result, SkinportError};
use crate::models::DiscountedItem;
use crate::store::write_atomic;

/// Storage for the most recently persisted filtered result set.
pub trait BaselineStore: Send + Sync {
    /// The previous run's filtered set; empty if there never was one.
    fn load_baseline(&self) -> Result<Vec<DiscountedItem>>;

    /// Replace the stored baseline with `items`.
    fn save_baseline(&self, items: &[DiscountedItem]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileBaseline
// ---------------------------------------------------------------------------

/// Baseline kept as one pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct FileBaseline {
    path: PathBuf,
}

impl FileBaseline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BaselineStore for FileBaseline {
    fn load_baseline(&self) -> Result<Vec<DiscountedItem>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no baseline yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents)
            .map_err(|e| SkinportError::corrupt(&self.path, format!("invalid baseline: {e}")))
    }

    fn save_baseline(&self, items: &[DiscountedItem]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(items)?;
        write_atomic(&self.path, &bytes)?;
        tracing::info!(path = %self.path.display(), items = items.len(), "saved baseline");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryBaseline
// ---------------------------------------------------------------------------

/// In-memory baseline, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBaseline {
    items: Mutex<Vec<DiscountedItem>>,
}

impl MemoryBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<DiscountedItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

impl BaselineStore for MemoryBaseline {
    fn load_baseline(&self) -> Result<Vec<DiscountedItem>> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_baseline(&self, items: &[DiscountedItem]) -> Result<()> {
        *self.items.lock().unwrap_or_else(PoisonError::into_inner) = items.to_vec();
        Ok(())
    }
}

impl<T: BaselineStore + ?Sized> BaselineStore for Arc<T> {
    fn load_baseline(&self) -> Result<Vec<DiscountedItem>> {
        (**self).load_baseline()
    }

    fn save_baseline(&self, items: &[DiscountedItem]) -> Result<()> {
        (**self).save_baseline(items)
    }
}
