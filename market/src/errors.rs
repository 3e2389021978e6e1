use std::time::Duration;

use thiserror::Error;

/// Failure to obtain a price for one symbol.
///
/// These never escape a build cycle: the builder folds them into an
/// error-only `Quote` for the affected instrument.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("missing price data for {0}")]
    MissingData(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
}
