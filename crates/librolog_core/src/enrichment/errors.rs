/// Failures of the enrichment client. They never leave the enrichment boundary: the [`Enricher`]
/// implementations log them and answer `None`.
///
/// [`Enricher`]: crate::enrichment::Enricher
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("no API key configured")]
    MissingApiKey,

    /// Error during the HTTP request, originating from `reqwest`.
    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The model answered, but not with the JSON that was asked for.
    #[error("unexpected response: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The response carried no candidate text at all.
    #[error("response contained no candidate text")]
    EmptyResponse,
}
