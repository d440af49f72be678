//! Error types for the quote pipeline.

use thiserror::Error;

/// Errors that can abort a quote.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// The CAD kernel could not read the upload, or found no shape in it.
    #[error("failed to read STEP file: {0}")]
    GeometryParse(String),

    /// The temporary copy of the upload could not be written or read.
    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed request input.
    #[error("invalid request: {0}")]
    Validation(String),
}

/// Result type for quote operations.
pub type Result<T> = std::result::Result<T, QuoteError>;
