//! Error types for Gridcalc core.

use thiserror::Error;

/// Errors that can occur in the Gridcalc document layer
#[derive(Error, Debug)]
pub enum GridcalcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("CSV file is empty")]
    EmptyCsv,

    #[error("Invalid cell assignment '{0}' (expected e.g. A1=42)")]
    InvalidCell(String),
}

pub type Result<T> = std::result::Result<T, GridcalcError>;
