//! Extraction errors surfaced to callers.

use thiserror::Error;

/// Why a price record could not be produced.
///
/// A missing product name is not an error; the record carries `None`.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Navigation or initial render failed or timed out.
    #[error("failed to load {url}: {source:#}")]
    LoadFailure {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// The polling deadline passed without an eligible candidate.
    #[error("no visible non-struck '$' price (red/black) found with the Alsuper selectors")]
    PriceNotFound,
}

impl ExtractError {
    /// HTTP status the service reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ExtractError::LoadFailure { .. } => 502,
            ExtractError::PriceNotFound => 500,
        }
    }
}
