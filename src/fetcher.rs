//! Market snapshot fetcher.
//!
//! Retrieves the full item listing either live from the Skinport API or from a
//! snapshot saved by an earlier fetch, and normalizes it into [`Item`]s.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, SubsecRound};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::{self, Credentials};
use crate::error::{Result, SkinportError};
use crate::models::{Item, SavedSnapshot, Snapshot};
use crate::store::SnapshotStore;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Which saved snapshot to read in offline mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRef {
    /// The newest `items_*.json` file in the data directory.
    Latest,
    /// An explicit snapshot file.
    Path(PathBuf),
}

/// Where a [`Snapshot`] comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// One GET against the items endpoint.
    Live { currency: String, app_id: u32 },
    /// A previously persisted snapshot.
    Saved(SnapshotRef),
}

impl Source {
    /// Live fetch for the default application (CS2).
    pub fn live(currency: impl Into<String>) -> Self {
        Source::Live {
            currency: currency.into(),
            app_id: config::DEFAULT_APP_ID,
        }
    }

    pub fn latest() -> Self {
        Source::Saved(SnapshotRef::Latest)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::Saved(SnapshotRef::Path(path.into()))
    }
}

// ---------------------------------------------------------------------------
// MarketFetcher
// ---------------------------------------------------------------------------

/// Fetches item snapshots and keeps a copy of every live response on disk.
pub struct MarketFetcher {
    api_base: String,
    credentials: Option<Credentials>,
    timeout: Duration,
    /// If true, live fetches are refused and only saved snapshots are used.
    pub offline: bool,
    client: OnceLock<Client>,
    store: SnapshotStore,
}

impl MarketFetcher {
    pub fn new(
        api_base: String,
        credentials: Option<Credentials>,
        timeout: Duration,
        offline: bool,
        store: SnapshotStore,
    ) -> Self {
        Self {
            api_base,
            credentials,
            timeout,
            offline,
            client: OnceLock::new(),
            store,
        }
    }

    /// The snapshot directory this fetcher writes to and reads from.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Lazy HTTP client, created on first live fetch.
    fn client(&self) -> Result<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(config::USER_AGENT)
            .build()
            .map_err(SkinportError::transport)?;
        Ok(self.client.get_or_init(|| client))
    }

    /// Produce a snapshot from `source`.
    pub fn fetch(&self, source: &Source) -> Result<Snapshot> {
        match source {
            Source::Live { currency, app_id } => self.fetch_live(currency, *app_id),
            Source::Saved(SnapshotRef::Latest) => self.store.load_latest(),
            Source::Saved(SnapshotRef::Path(path)) => self.store.load(path),
        }
    }

    /// Saved snapshots, newest first.
    pub fn list_saved(&self) -> Result<Vec<SavedSnapshot>> {
        self.store.list_saved()
    }

    fn fetch_live(&self, currency: &str, app_id: u32) -> Result<Snapshot> {
        if self.offline {
            return Err(SkinportError::NotFound(
                "live fetch requested but offline mode is enabled".into(),
            ));
        }

        let url = format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            config::ITEMS_PATH
        );
        tracing::info!(%url, currency, app_id, "fetching items");

        let mut request = self
            .client()?
            .get(&url)
            .query(&[("currency", currency.to_string()), ("app_id", app_id.to_string())])
            .header(ACCEPT, "application/json");
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.client_id, Some(&creds.client_secret));
        }

        let resp = request.send().map_err(SkinportError::transport)?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let reason = if self.credentials.is_some() {
                format!("credentials were rejected (HTTP {})", status.as_u16())
            } else {
                format!(
                    "endpoint requires credentials but none are configured (HTTP {})",
                    status.as_u16()
                )
            };
            tracing::warn!(status = status.as_u16(), "{reason}");
            return Err(SkinportError::Authentication(reason));
        }

        if !status.is_success() {
            let body = resp.text().ok().filter(|b| !b.is_empty());
            tracing::warn!(status = status.as_u16(), "items request failed");
            return Err(SkinportError::Transport {
                status: Some(status.as_u16()),
                message: format!("unexpected status {status}"),
                body,
            });
        }

        let value: Value = resp.json().map_err(SkinportError::transport)?;
        let items = normalize_items(&value).ok_or_else(|| SkinportError::Transport {
            status: Some(status.as_u16()),
            message: "expected a JSON array of items".into(),
            body: Some(truncate(&value.to_string(), 512)),
        })?;

        self.store.save(Snapshot::new(now(), items))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Normalize a raw `/v1/items` response.
///
/// Returns `None` if `value` is not an array. Elements without a
/// `market_hash_name` are dropped.
pub fn normalize_items(value: &Value) -> Option<Vec<Item>> {
    let raw = value.as_array()?;
    let mut items = Vec::with_capacity(raw.len());
    for (i, v) in raw.iter().enumerate() {
        match Item::from_value(v) {
            Some(item) => items.push(item),
            None => tracing::warn!(index = i, "skipping element without market_hash_name"),
        }
    }
    Some(items)
}

fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
