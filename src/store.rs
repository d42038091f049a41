//! On-disk snapshot directory.
//!
//! Every live fetch is written as `items_<YYYYMMDD_HHMMSS>.json` so it can be
//! replayed later without hitting the API. A second snapshot captured within
//! the same second (or a repeated wall-clock second after a DST change) gets a
//! `-<n>` suffix, e.g. `items_20240101_120000-1.json`. Snapshot files are never
//! modified after they are written.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config;
use crate::error::{Result, SkinportError};
use crate::models::{Item, SavedSnapshot, Snapshot};

/// Serializes every write into the data directory (snapshots and baseline).
static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Upper bound on `-<n>` suffixes tried for one capture second.
const MAX_SNAPSHOTS_PER_SECOND: u32 = 1000;

/// Write `bytes` to a temp file in `dir`. The file deletes itself when
/// dropped without being persisted.
fn stage(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    Ok(tmp)
}

/// Write `bytes` to `dest` via a temp file in the same directory and a rename,
/// so readers never observe a half-written file. Replaces `dest` if it exists.
pub(crate) fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    stage(dir, bytes)?
        .persist(dest)
        .map_err(|e| SkinportError::Io(e.error))?;
    Ok(())
}

/// Reads and writes item snapshots in a single directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Directory holding the `items_*.json` files.
    pub data_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `data_dir`, creating the directory if needed.
    ///
    /// If `data_dir` is `None`, uses the platform data directory.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let dir = data_dir.unwrap_or_else(config::default_data_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { data_dir: dir })
    }

    /// Path a snapshot captured at `captured_at` is stored under when no
    /// other snapshot was taken in the same second.
    pub fn path_for(&self, captured_at: NaiveDateTime) -> PathBuf {
        self.numbered_path(captured_at, 0)
    }

    fn numbered_path(&self, captured_at: NaiveDateTime, seq: u32) -> PathBuf {
        let ts = captured_at.format(config::SNAPSHOT_TIMESTAMP_FORMAT);
        let name = match seq {
            0 => format!("{}{ts}.{}", config::SNAPSHOT_PREFIX, config::SNAPSHOT_EXTENSION),
            n => format!("{}{ts}-{n}.{}", config::SNAPSHOT_PREFIX, config::SNAPSHOT_EXTENSION),
        };
        self.data_dir.join(name)
    }

    /// Persist a snapshot as a pretty-printed JSON array and return it with
    /// its path filled in.
    ///
    /// Existing files are never replaced: if the name for this second is
    /// taken, the next free `-<n>` suffix is used.
    pub fn save(&self, mut snapshot: Snapshot) -> Result<Snapshot> {
        let bytes = serde_json::to_vec_pretty(&snapshot.items)?;

        let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut tmp = stage(&self.data_dir, &bytes)?;
        let mut seq = 0;
        let path = loop {
            if seq >= MAX_SNAPSHOTS_PER_SECOND {
                return Err(SkinportError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "too many snapshots captured at {}",
                        snapshot.captured_at.format(config::SNAPSHOT_TIMESTAMP_FORMAT)
                    ),
                )));
            }
            let candidate = self.numbered_path(snapshot.captured_at, seq);
            match tmp.persist_noclobber(&candidate) {
                Ok(_) => break candidate,
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                    tmp = e.file;
                    seq += 1;
                }
                Err(e) => return Err(SkinportError::Io(e.error)),
            }
        };
        tracing::info!(
            path = %path.display(),
            items = snapshot.items.len(),
            "saved snapshot"
        );
        snapshot.path = Some(path);
        Ok(snapshot)
    }

    /// List saved snapshots, newest first.
    ///
    /// Files that don't follow the `items_<timestamp>.json` pattern are
    /// ignored. A missing directory yields an empty list.
    pub fn list_saved(&self) -> Result<Vec<SavedSnapshot>> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut saved = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some((captured_at, seq)) = split_snapshot_name(&path) {
                saved.push((seq, SavedSnapshot { captured_at, path }));
            }
        }
        saved.sort_by(|(seq_a, a), (seq_b, b)| {
            (b.captured_at, seq_b).cmp(&(a.captured_at, seq_a))
        });
        Ok(saved.into_iter().map(|(_, s)| s).collect())
    }

    /// The most recently captured snapshot on disk.
    pub fn latest(&self) -> Result<SavedSnapshot> {
        self.list_saved()?.into_iter().next().ok_or_else(|| {
            SkinportError::NotFound(format!(
                "no saved snapshots in {}",
                self.data_dir.display()
            ))
        })
    }

    /// Load the snapshot stored at `path`.
    ///
    /// Elements are normalized the same way live responses are, so raw API
    /// dumps can be replayed too.
    pub fn load(&self, path: &Path) -> Result<Snapshot> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SkinportError::NotFound(format!(
                    "snapshot {} does not exist",
                    path.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| SkinportError::corrupt(path, format!("invalid JSON: {e}")))?;
        let raw = value
            .as_array()
            .ok_or_else(|| SkinportError::corrupt(path, "expected a JSON array of items"))?;

        let items = raw
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Item::from_value(v).ok_or_else(|| {
                    SkinportError::corrupt(path, format!("element {i} is not an item object"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let captured_at = match parse_snapshot_name(path) {
            Some(ts) => ts,
            None => modified_time(path)?,
        };

        tracing::debug!(path = %path.display(), items = items.len(), "loaded snapshot");
        Ok(Snapshot {
            captured_at,
            items,
            path: Some(path.to_path_buf()),
        })
    }

    /// Load the newest saved snapshot.
    pub fn load_latest(&self) -> Result<Snapshot> {
        let latest = self.latest()?;
        self.load(&latest.path)
    }

    /// Delete all but the `keep` newest snapshots. Returns how many were removed.
    pub fn prune(&self, keep: usize) -> Result<usize> {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for old in self.list_saved()?.into_iter().skip(keep) {
            fs::remove_file(&old.path)?;
            removed += 1;
        }
        if removed > 0 {
            tracing::info!(removed, keep, "pruned old snapshots");
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse the capture timestamp out of `items_<YYYYMMDD_HHMMSS>[-<n>].json`.
pub fn parse_snapshot_name(path: &Path) -> Option<NaiveDateTime> {
    split_snapshot_name(path).map(|(ts, _)| ts)
}

/// Timestamp and same-second sequence number (0 for the unsuffixed file).
fn split_snapshot_name(path: &Path) -> Option<(NaiveDateTime, u32)> {
    if path.extension().and_then(|e| e.to_str()) != Some(config::SNAPSHOT_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let rest = stem.strip_prefix(config::SNAPSHOT_PREFIX)?;
    let (ts, seq) = match rest.split_once('-') {
        Some((ts, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => {
            (ts, n.parse().ok()?)
        }
        Some(_) => return None,
        None => (rest, 0),
    };
    let ts = NaiveDateTime::parse_from_str(ts, config::SNAPSHOT_TIMESTAMP_FORMAT).ok()?;
    Some((ts, seq))
}

fn modified_time(path: &Path) -> Result<NaiveDateTime> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}
