use librolog_core::record::draft::DraftError;
use librolog_core::store::StoreError;

/// The LibroLog command-line error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A mutation could not be persisted, or collided with an existing id
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The edited record was rejected before reaching the store
    #[error("invalid record: {0}")]
    Draft(#[from] DraftError),
    #[error("no record with id {0}")]
    NotFound(String),
    /// Enrichment was requested, but no API key is configured
    #[error("enrichment is disabled, set GEMINI_API_KEY to enable it")]
    EnrichmentDisabled,
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read confirmation: {0}")]
    Prompt(#[from] std::io::Error),
}
