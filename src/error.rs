use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SkinportError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
        /// Response body, kept for diagnostics when the server sent one.
        body: Option<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt data in {}: {reason}", .path.display())]
    CorruptData { path: PathBuf, reason: String },

    #[error("Invalid filter configuration: {0}")]
    Validation(String),

    #[error("A search is already in progress")]
    Busy,

    #[error("Background search panicked: {0}")]
    Panicked(String),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SkinportError {
    /// Build a [`SkinportError::Transport`] from a reqwest failure that never
    /// produced a usable response (DNS, TLS, timeout, ...).
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        SkinportError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message,
            body: None,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SkinportError::CorruptData {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SkinportError>;
