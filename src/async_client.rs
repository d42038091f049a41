//! Async wrapper around [`SkinportClient`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all client operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free while
//! the HTTP request and file I/O run.
//!
//! # Example
//!
//! ```no_run
//! use skinport_deals::{AsyncSkinportClient, FilterConfig, SearchRequest};
//!
//! # async fn example() -> skinport_deals::Result<()> {
//! let client = AsyncSkinportClient::builder().build().await?;
//!
//! let outcome = client
//!     .search(SearchRequest::live(FilterConfig::default()))
//!     .await?;
//!
//! // Run any sync client method via closure
//! let saved = client.run(|c| c.list_saved()).await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{self, Credentials};
use crate::error::{Result, SkinportError};
use crate::{SearchOutcome, SearchRequest, SkinportClient};

// ---------------------------------------------------------------------------
// AsyncSkinportClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncSkinportClient`].
pub struct AsyncSkinportClientBuilder {
    data_dir: Option<PathBuf>,
    credentials: Option<Credentials>,
    offline: bool,
    timeout: Duration,
}

impl Default for AsyncSkinportClientBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            credentials: None,
            offline: false,
            timeout: config::DEFAULT_TIMEOUT,
        }
    }
}

impl AsyncSkinportClientBuilder {
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client on the blocking pool (it creates the data directory).
    pub async fn build(self) -> Result<AsyncSkinportClient> {
        tokio::task::spawn_blocking(move || {
            let mut builder = SkinportClient::builder()
                .credentials(self.credentials)
                .offline(self.offline)
                .timeout(self.timeout);
            if let Some(dir) = self.data_dir {
                builder = builder.data_dir(dir);
            }
            Ok(AsyncSkinportClient::from_client(builder.build()?))
        })
        .await
        .map_err(join_error)?
    }
}

// ---------------------------------------------------------------------------
// AsyncSkinportClient
// ---------------------------------------------------------------------------

/// Async wrapper around [`SkinportClient`].
///
/// [`SkinportClient`] is `Sync`, so no extra lock is needed; the client's own
/// baseline lock still serializes concurrent searches.
#[derive(Clone)]
pub struct AsyncSkinportClient {
    inner: Arc<SkinportClient>,
}

impl AsyncSkinportClient {
    pub fn builder() -> AsyncSkinportClientBuilder {
        AsyncSkinportClientBuilder::default()
    }

    /// Wrap an already configured client (e.g. one with a custom baseline).
    pub fn from_client(client: SkinportClient) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    /// Run a sync client operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SkinportClient) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&client))
            .await
            .map_err(join_error)?
    }

    /// Convenience wrapper around [`SkinportClient::search`].
    pub async fn search(&self, request: SearchRequest) -> Result<SearchOutcome> {
        self.run(move |c| c.search(&request)).await
    }
}

fn join_error(e: tokio::task::JoinError) -> SkinportError {
    SkinportError::Io(std::io::Error::other(format!("task join error: {e}")))
}
