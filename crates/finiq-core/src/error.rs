//! Error types for finiq

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No daily income rate is available for budgeting
    #[error("Estimated daily income not set. Upload an income statement first")]
    MissingIncome,

    /// The statement had no row with a positive income amount
    #[error("No valid income rows (amount > 0) found")]
    NoIncomeData,

    /// A statement row could not be parsed
    #[error("Invalid {field} in row {row}: {value:?}")]
    MalformedRecord {
        /// 1-based data row (header excluded)
        row: usize,
        field: &'static str,
        value: String,
    },

    /// Allocation percentages rejected by the strict validation strategy
    #[error("Invalid allocation policy: {0}")]
    InvalidPolicy(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Errors the user can fix by changing their input (bad upload, no income yet)
    ///
    /// These map to a 4xx-style response at the boundary and are never retried.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::MissingIncome
                | Self::NoIncomeData
                | Self::MalformedRecord { .. }
                | Self::InvalidPolicy(_)
                | Self::Import(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
