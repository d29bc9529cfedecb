// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found, 500 from the peer API

    #[error("No page published for {0}")]
    PageNotFound(String),

    #[error("Empty payload: {0}")]
    EmptyPayload(String),

    #[error("Failed to parse Screener response: {0}")]
    Parse(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Table has no rows")]
    NoRows,

    #[error("Table has no cells")]
    NoCells,

    #[error("Required element not found: {0}")]
    MissingElement(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Lookup table is missing required column {0}")]
    MissingColumn(&'static str),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Screener interaction failed: {0}")]
    Screener(#[from] ScreenerError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("No data available for symbol '{0}'")]
    NoData(String),
}
