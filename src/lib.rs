//! Skinport deals client for Rust.
//!
//! Fetches the full Skinport item listing, keeps a copy of every fetch on
//! disk, filters it down to discounted items, and reports which of those are
//! new since the previous run.
//!
//! # Quick start
//!
//! ```no_run
//! use skinport_deals::{FilterConfig, SearchRequest, SkinportClient};
//!
//! let client = SkinportClient::builder().build().unwrap();
//!
//! let filter = FilterConfig {
//!     min_discount_percent: 15.0,
//!     min_price: 1.0,
//!     ..FilterConfig::default()
//! };
//! let outcome = client.search(&SearchRequest::live(filter)).unwrap();
//! for item in &outcome.changes.new_items {
//!     println!("{} -{:.2}%", item.name(), item.discount_percent);
//! }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod baseline;
pub mod config;
pub mod diff;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod models;
pub mod notify;
pub mod store;
pub mod worker;

#[cfg(feature = "async")]
pub use async_client::AsyncSkinportClient;
pub use baseline::{BaselineStore, FileBaseline, MemoryBaseline};
pub use config::Credentials;
pub use diff::{ChangeSet, DiffStrategy, PriceMove};
pub use error::{Result, SkinportError};
pub use fetcher::{MarketFetcher, SnapshotRef, Source};
pub use models::{DiscountedItem, FilterConfig, Item, SavedSnapshot, Snapshot};
pub use notify::NotificationSink;
pub use store::SnapshotStore;
pub use worker::SearchWorker;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// SkinportClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`SkinportClient`].
///
/// This is the single place configuration enters the library: nothing below
/// it reads the environment.
pub struct SkinportClientBuilder {
    data_dir: Option<PathBuf>,
    api_base: String,
    credentials: Option<Credentials>,
    offline: bool,
    timeout: Duration,
    baseline: Option<Box<dyn BaselineStore>>,
    diff_strategy: DiffStrategy,
}

impl Default for SkinportClientBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            api_base: config::API_BASE.to_string(),
            credentials: None,
            offline: false,
            timeout: config::DEFAULT_TIMEOUT,
            baseline: None,
            diff_strategy: DiffStrategy::default(),
        }
    }
}

impl SkinportClientBuilder {
    /// Set the directory snapshots (and the default baseline file) live in.
    ///
    /// If not set, the platform data directory is used (e.g.
    /// `~/.local/share/skinport-deals` on Linux).
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Override the API base URL. Defaults to `https://api.skinport.com/v1`.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Send HTTP Basic credentials with live requests.
    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// When offline, live fetches are refused and only saved snapshots are
    /// used. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// HTTP request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom baseline repository instead of `<data_dir>/baseline.json`.
    pub fn baseline(mut self, baseline: impl BaselineStore + 'static) -> Self {
        self.baseline = Some(Box::new(baseline));
        self
    }

    /// How search results are matched against the baseline.
    /// Defaults to [`DiffStrategy::Structural`].
    pub fn diff_strategy(mut self, strategy: DiffStrategy) -> Self {
        self.diff_strategy = strategy;
        self
    }

    /// Build the client. Creates the data directory; makes no network calls.
    pub fn build(self) -> Result<SkinportClient> {
        let store = SnapshotStore::new(self.data_dir)?;
        let baseline: Box<dyn BaselineStore> = match self.baseline {
            Some(custom) => custom,
            None => Box::new(FileBaseline::new(store.data_dir.join(config::BASELINE_FILE))),
        };
        let fetcher = MarketFetcher::new(
            self.api_base,
            self.credentials,
            self.timeout,
            self.offline,
            store,
        );
        Ok(SkinportClient {
            fetcher,
            baseline,
            diff_strategy: self.diff_strategy,
            baseline_lock: Mutex::new(()),
        })
    }
}

// ---------------------------------------------------------------------------
// SearchRequest / SearchOutcome
// ---------------------------------------------------------------------------

/// One fetch → filter → diff run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub source: Source,
    pub filter: FilterConfig,
}

impl SearchRequest {
    /// Live fetch in the filter's currency.
    pub fn live(filter: FilterConfig) -> Self {
        Self {
            source: Source::live(filter.currency.clone()),
            filter,
        }
    }

    /// Replay a saved snapshot.
    pub fn saved(snapshot: SnapshotRef, filter: FilterConfig) -> Self {
        Self {
            source: Source::Saved(snapshot),
            filter,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub captured_at: NaiveDateTime,
    pub snapshot_path: Option<PathBuf>,
    /// Number of items in the snapshot before filtering.
    pub snapshot_len: usize,
    /// Filtered result set, best discount first.
    pub results: Vec<DiscountedItem>,
    pub changes: ChangeSet,
    pub currency: String,
}

// ---------------------------------------------------------------------------
// SkinportClient
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Owns the [`MarketFetcher`] (and through it the [`SnapshotStore`]) plus the
/// injected [`BaselineStore`]. Safe to share between threads.
pub struct SkinportClient {
    fetcher: MarketFetcher,
    baseline: Box<dyn BaselineStore>,
    diff_strategy: DiffStrategy,
    /// Held across the baseline load → diff → save sequence.
    baseline_lock: Mutex<()>,
}

impl SkinportClient {
    pub fn builder() -> SkinportClientBuilder {
        SkinportClientBuilder::default()
    }

    /// Fetch a snapshot live or from disk.
    pub fn fetch(&self, source: &Source) -> Result<Snapshot> {
        self.fetcher.fetch(source)
    }

    /// Saved snapshots, newest first.
    pub fn list_saved(&self) -> Result<Vec<SavedSnapshot>> {
        self.fetcher.list_saved()
    }

    /// Filter a snapshot. See [`filter::filter`].
    pub fn filter(&self, snapshot: &Snapshot, config: &FilterConfig) -> Result<Vec<DiscountedItem>> {
        filter::filter(snapshot, config)
    }

    /// Diff two filtered sets with this client's strategy.
    pub fn diff(&self, current: &[DiscountedItem], previous: &[DiscountedItem]) -> ChangeSet {
        diff::diff_with(current, previous, self.diff_strategy)
    }

    /// Run the whole pipeline and roll the baseline forward.
    ///
    /// The filter configuration is validated before anything is fetched.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        request.filter.validate()?;

        let snapshot = self.fetch(&request.source)?;
        let results = self.filter(&snapshot, &request.filter)?;

        let changes = {
            let _guard = self
                .baseline_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let previous = self.baseline.load_baseline()?;
            let changes = self.diff(&results, &previous);
            self.baseline.save_baseline(&results)?;
            changes
        };

        tracing::info!(
            snapshot = snapshot.len(),
            matched = results.len(),
            new = changes.new_items.len(),
            repeated = changes.repeated_items.len(),
            "search finished"
        );

        Ok(SearchOutcome {
            captured_at: snapshot.captured_at,
            snapshot_path: snapshot.path,
            snapshot_len: snapshot.items.len(),
            results,
            changes,
            currency: request.filter.currency.clone(),
        })
    }

    /// Hand a finished search to a notification sink.
    ///
    /// Errors are returned to the caller; the baseline written by
    /// [`search`](Self::search) stays as it is.
    pub fn notify(&self, sink: &dyn NotificationSink, outcome: &SearchOutcome) -> Result<()> {
        sink.deliver(&outcome.changes, &outcome.currency)
            .inspect_err(|e| tracing::warn!(error = %e, "notification failed"))
    }

    /// The current baseline, without modifying it.
    pub fn baseline(&self) -> Result<Vec<DiscountedItem>> {
        self.baseline.load_baseline()
    }

    /// Delete all but the `keep` newest snapshots.
    pub fn prune_snapshots(&self, keep: usize) -> Result<usize> {
        self.fetcher.store().prune(keep)
    }

    pub fn fetcher(&self) -> &MarketFetcher {
        &self.fetcher
    }

    pub fn store(&self) -> &SnapshotStore {
        self.fetcher.store()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for SkinportClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SkinportClient(data_dir={}, diff={:?}, offline={})",
            self.store().data_dir.display(),
            self.diff_strategy,
            self.fetcher.offline
        )
    }
}
