use crate::enrichment::errors::EnrichmentError;
use crate::enrichment::{BookDetails, Enricher, Recommendation};
use core::future::Future;
use core::time::Duration;
use log::{info, warn};
use reqwest::{ClientBuilder, header};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use urlencoding::encode;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LANGUAGE: &str = "English";

/// Client for the Gemini `generateContent` endpoint, asking for JSON that matches a fixed schema.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    /// A HTTP client reused for every request
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    language: String,
}

impl GeminiClient {
    /// Creates a client with the default model, endpoint and answer language.
    /// # Errors
    /// Fails if `api_key` is blank or the HTTP client cannot be built.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn new(api_key: &str) -> Result<Self, EnrichmentError> {
        if api_key.trim().is_empty() {
            return Err(EnrichmentError::MissingApiKey);
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(1)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            api_key: api_key.trim().to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
        })
    }

    #[must_use]
    #[inline]
    pub fn with_model(mut self, model: &str) -> Self {
        model.clone_into(&mut self.model);
        self
    }

    #[must_use]
    #[inline]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        base_url
            .trim_end_matches('/')
            .clone_into(&mut self.base_url);
        self
    }

    /// Language the model is asked to answer in.
    #[must_use]
    #[inline]
    pub fn with_language(mut self, language: &str) -> Self {
        language.clone_into(&mut self.language);
        self
    }

    #[must_use]
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, encode(&self.model)
        )
    }

    /// Asks for the synopsis and category of `title`.
    /// # Errors
    /// Fails on transport errors, non-success statuses, or an answer that does not match the
    /// requested schema.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn fetch_book_details(&self, title: &str) -> Result<BookDetails, EnrichmentError> {
        self.generate(
            book_details_prompt(title, &self.language),
            book_details_schema(),
        )
        .await
    }

    /// Asks for one book similar to `in_progress_titles`, or a well-known one if there are none.
    /// # Errors
    /// Same failure modes as [`Self::fetch_book_details`].
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn fetch_recommendation(
        &self,
        in_progress_titles: &[String],
    ) -> Result<Recommendation, EnrichmentError> {
        self.generate(
            recommendation_prompt(in_progress_titles, &self.language),
            recommendation_schema(),
        )
        .await
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: Value,
    ) -> Result<T, EnrichmentError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        let response: Value = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(serde_json::from_str(extract_candidate_text(&response)?.trim())?)
    }
}

impl Enricher for GeminiClient {
    #[inline]
    fn lookup_book_details(&self, title: &str) -> impl Future<Output = Option<BookDetails>> + Send {
        async move {
            if title.trim().is_empty() {
                return None;
            }
            match self.fetch_book_details(title.trim()).await {
                Ok(details) => {
                    info!("Fetched details for {title:?}");
                    Some(details)
                }
                Err(err) => {
                    warn!("Book details lookup for {title:?} failed: {err}");
                    None
                }
            }
        }
    }

    #[inline]
    fn daily_recommendation(
        &self,
        in_progress_titles: &[String],
    ) -> impl Future<Output = Option<Recommendation>> + Send {
        async move {
            match self.fetch_recommendation(in_progress_titles).await {
                Ok(recommendation) => Some(recommendation),
                Err(err) => {
                    warn!("Recommendation request failed: {err}");
                    None
                }
            }
        }
    }
}

#[must_use]
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn book_details_prompt(title: &str, language: &str) -> String {
    format!(
        "Provide information about the book titled \"{title}\" in {language}. \
         Include a short synopsis and its category."
    )
}

#[must_use]
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn recommendation_prompt(in_progress_titles: &[String], language: &str) -> String {
    let context = if in_progress_titles.is_empty() {
        "Recommend one well-known, widely loved book.".to_owned()
    } else {
        format!(
            "The reader is currently reading: [{}]. Recommend one similar book.",
            in_progress_titles.join(", ")
        )
    };
    format!("{context} Answer in {language}.")
}

#[must_use]
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn book_details_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": { "type": "STRING" },
            "category": { "type": "STRING" },
            "imageUrl": { "type": "STRING" },
        },
        "required": ["description", "category"],
    })
}

#[must_use]
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn recommendation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "author": { "type": "STRING" },
            "description": { "type": "STRING" },
            "category": { "type": "STRING" },
        },
        "required": ["title", "author", "description", "category"],
    })
}

/// Text of the first part of the first candidate in a `generateContent` response.
/// # Errors
/// [`EnrichmentError::EmptyResponse`] if the path does not exist or is not a string.
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn extract_candidate_text(response: &Value) -> Result<&str, EnrichmentError> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or(EnrichmentError::EmptyResponse)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response_with(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP",
            }],
        })
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(
            GeminiClient::new("   "),
            Err(EnrichmentError::MissingApiKey)
        ));
    }

    #[test]
    fn endpoint_uses_model_and_base() {
        let client = GeminiClient::new("key")
            .unwrap()
            .with_base_url("http://localhost:8080/")
            .with_model("gemini-test");

        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-test:generateContent"
        );
        assert_eq!(GeminiClient::new("key").unwrap().model(), DEFAULT_MODEL);
    }

    #[test]
    fn recommendation_prompt_depends_on_reading_list() {
        let seeded = recommendation_prompt(&["Dune".to_owned(), "Emma".to_owned()], "English");
        assert!(seeded.contains("[Dune, Emma]"));

        let cold = recommendation_prompt(&[], "Korean");
        assert!(cold.contains("well-known"));
        assert!(cold.ends_with("Answer in Korean."));
    }

    #[test]
    fn schemas_require_the_right_fields() {
        assert_eq!(
            book_details_schema()["required"],
            json!(["description", "category"])
        );
        assert_eq!(
            recommendation_schema()["required"],
            json!(["title", "author", "description", "category"])
        );
    }

    #[test]
    fn candidate_text_is_extracted() {
        let response = response_with(r#" {"description": "Spice.", "category": "SF"} "#);
        let details: BookDetails =
            serde_json::from_str(extract_candidate_text(&response).unwrap().trim()).unwrap();

        assert_eq!(
            details,
            BookDetails::new("Spice.".to_owned(), "SF".to_owned(), None)
        );
    }

    #[test]
    fn missing_candidates_are_an_error() {
        assert!(matches!(
            extract_candidate_text(&json!({ "candidates": [] })),
            Err(EnrichmentError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn blank_title_skips_the_request() {
        let client = GeminiClient::new("key")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        assert_eq!(client.lookup_book_details("  ").await, None);
    }

    #[tokio::test]
    async fn unreachable_service_yields_none() {
        let client = GeminiClient::new("key")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        assert_eq!(client.lookup_book_details("Dune").await, None);
        assert_eq!(client.daily_recommendation(&[]).await, None);
    }
}
