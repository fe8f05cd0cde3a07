use chrono::{DateTime, Utc};
use ecocount_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("Start date ({start}) must be before end date ({end})")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Unsupported frequency '{0}'. Use one of D, W, M, Y")]
    UnsupportedFrequency(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("No counter payload found ({scripts_scanned} scripts scanned, {candidates} candidates)")]
    EmptyPayload {
        scripts_scanned: usize,
        candidates: usize,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),
}

pub type Result<T> = std::result::Result<T, CounterError>;
