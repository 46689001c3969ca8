//! Error types for garmin-daily

use thiserror::Error;

/// Errors that can occur while aggregating a day or talking to Garmin / Google Sheets
#[derive(Debug, Error)]
pub enum DailyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Required column '{column}' not found in spreadsheet header. \
         Missing columns: {missing:?}. Expected header names: {expected:?}"
    )]
    MissingColumn {
        column: String,
        missing: Vec<String>,
        expected: Vec<String>,
    },

    #[error("Garmin Connect authentication failed: {0}. Check GARMIN_EMAIL and GARMIN_PASSWORD")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} rate limit: gave up after {attempts} attempts")]
    RetriesExhausted { service: String, attempts: u32 },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParse(String),

    #[error("Google Sheets error: {0}")]
    Sheet(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
