use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Marker {0} not found in payload text")]
    MarkerNotFound(String),

    #[error("Unbalanced braces: object opened at byte {start} never closes")]
    UnbalancedBraces { start: usize },

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScanError {
    /// True when the request gave up waiting on the server.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScanError::Transport(e) if e.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
