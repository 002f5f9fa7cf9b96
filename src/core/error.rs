// Error handling for buoy spectrum ingestion

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::constants::SourceKind;

pub type Result<T> = std::result::Result<T, BuoyError>;

#[derive(Error, Debug)]
pub enum BuoyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Parse error in {kind} source at line {line}: {message}")]
    ParseError {
        kind: SourceKind,
        line: usize,
        message: String,
    },

    #[error("Invalid frequency table: {0}")]
    InvalidBinTable(String),

    #[error("Invalid direction step: {0} degrees")]
    InvalidDirectionStep(f64),

    #[error(
        "Alignment fault for station {station} at row {row}: {expected} vs {found} ({kind} source)"
    )]
    AlignmentFault {
        station: String,
        row: usize,
        kind: SourceKind,
        expected: String,
        found: String,
    },

    #[error("{kind} row at {timestamp} has {found} values, frequency table has {expected} bins")]
    BinCountMismatch {
        kind: SourceKind,
        timestamp: DateTime<Utc>,
        expected: usize,
        found: usize,
    },

    #[error("Station not registered: {0}")]
    StationNotFound(String),

    #[error("Time step not found: {0}")]
    TimeStepNotFound(u64),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Invalid UTF-8 in source data")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl BuoyError {
    /// True for faults that must abort a station run without touching its
    /// already-processed time steps.
    pub fn is_alignment_fault(&self) -> bool {
        matches!(self, BuoyError::AlignmentFault { .. })
    }
}
