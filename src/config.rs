use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const API_BASE: &str = "https://api.skinport.com/v1";
pub const ITEMS_PATH: &str = "items";

/// Steam application id for Counter-Strike 2.
pub const DEFAULT_APP_ID: u32 = 730;
pub const DEFAULT_CURRENCY: &str = "EUR";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const USER_AGENT: &str = concat!("skinport-deals/", env!("CARGO_PKG_VERSION"));

pub const SNAPSHOT_PREFIX: &str = "items_";
pub const SNAPSHOT_EXTENSION: &str = "json";
/// `chrono` format of the timestamp embedded in snapshot file names.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const BASELINE_FILE: &str = "baseline.json";

pub const CLIENT_ID_VAR: &str = "SKINPORT_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SKINPORT_CLIENT_SECRET";

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("skinport-deals")
    } else {
        PathBuf::from(".skinport-deals")
    }
}

/// Client id / secret pair used for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read `SKINPORT_CLIENT_ID` / `SKINPORT_CLIENT_SECRET` from the process
    /// environment. Returns `None` unless both are set and non-empty.
    ///
    /// Only meant to be called once at start-up; the library itself never
    /// looks at the environment.
    pub fn from_env() -> Option<Self> {
        let id = std::env::var(CLIENT_ID_VAR).ok().filter(|v| !v.is_empty())?;
        let secret = std::env::var(CLIENT_SECRET_VAR)
            .ok()
            .filter(|v| !v.is_empty())?;
        Some(Self::new(id, secret))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
