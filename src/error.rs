use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonthlyStatisticsError {
    #[error("Invalid record in {source_name} at line {line}: {reason}")]
    InvalidRecord {
        source_name: String,
        line: u64,
        reason: String,
    },

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(i64),

    #[error("No source files matching '*.csv*' found in {0}")]
    NoSourceFiles(String),

    #[error("Duplicate monthly average for {product_code}/{entity_code} in month {month}")]
    DuplicateMonthlyAverage {
        product_code: String,
        entity_code: String,
        month: u32,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid source pattern: {0}")]
    PatternError(#[from] glob::PatternError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MonthlyStatisticsError>;
