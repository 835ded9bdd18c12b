//! Summarization inference client.
//!
//! The article body is split into fixed-size character slices, each slice is
//! summarized by a hosted inference call, and a second condensing pass turns
//! the collected summaries into one short prompt string.

use crate::config;
use crate::config::Settings;
use crate::utils;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

const INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";

/// Errors from summarization inference
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// No inference API key was configured
    #[error("summarization API key is not configured")]
    MissingApiKey,
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),
    /// The inference endpoint rejected the request
    #[error("summarization API error: {0}")]
    Api(String),
    /// The response carried no summary text
    #[error("summarization returned no text")]
    EmptySummary,
    /// Condensing was asked for with zero collected summaries
    #[error("no summaries available to condense")]
    NothingToCondense,
}

/// Client for the hosted summarization model
pub struct SummaryClient {
    client: HttpClient,
    endpoint: String,
    api_key: Option<String>,
}

impl SummaryClient {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: utils::create_http_client(),
            endpoint: format!("{INFERENCE_BASE_URL}/{}", config::SUMMARY_MODEL),
            api_key: settings.hf_api_key.clone(),
        }
    }

    /// Splits an article body into the fixed-size slices fed to inference.
    #[must_use]
    pub fn chunk(content: &str) -> Vec<String> {
        utils::chunk_chars(content, config::SUMMARY_CHUNK_CHARS)
    }

    /// One summarization inference call.
    ///
    /// # Errors
    ///
    /// Returns a `SummarizeError` if the key is missing, the call fails, or
    /// the response carries no summary text.
    pub async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let api_key = self.api_key.as_deref().ok_or(SummarizeError::MissingApiKey)?;

        let body = json!({
            "inputs": text,
            "parameters": {
                "max_length": config::SUMMARY_MAX_LENGTH,
                "min_length": config::SUMMARY_MIN_LENGTH,
                "do_sample": false,
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizeError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let truncated: String = text.chars().take(500).collect();
            return Err(SummarizeError::Api(format!("{status} - {truncated}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| SummarizeError::Api(e.to_string()))?;

        let summary = parse_summary(&value)?;
        debug!(chars = summary.chars().count(), "summarized slice");
        Ok(summary)
    }

    /// Condenses per-slice summaries into one short prompt string.
    ///
    /// # Errors
    ///
    /// Returns `NothingToCondense` when no summaries survived, otherwise the
    /// same errors as [`SummaryClient::summarize`].
    pub async fn condense(&self, summaries: &[String]) -> Result<String, SummarizeError> {
        if summaries.is_empty() {
            return Err(SummarizeError::NothingToCondense);
        }
        self.summarize(&summaries.join("\n")).await
    }
}

/// The endpoint answers `[{"summary_text": "..."}]`.
pub(crate) fn parse_summary(value: &Value) -> Result<String, SummarizeError> {
    value
        .get(0)
        .and_then(|entry| entry.get("summary_text"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or(SummarizeError::EmptySummary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_without_key() -> SummaryClient {
        SummaryClient {
            client: utils::create_http_client(),
            endpoint: format!("{INFERENCE_BASE_URL}/{}", config::SUMMARY_MODEL),
            api_key: None,
        }
    }

    #[test]
    fn parses_inference_response() {
        let value = json!([{"summary_text": "A short recap."}]);
        assert_eq!(
            parse_summary(&value).expect("should parse"),
            "A short recap."
        );
    }

    #[test]
    fn response_without_summary_text_is_an_error() {
        assert!(matches!(
            parse_summary(&json!([])),
            Err(SummarizeError::EmptySummary)
        ));
        assert!(matches!(
            parse_summary(&json!({"error": "loading"})),
            Err(SummarizeError::EmptySummary)
        ));
    }

    #[test]
    fn chunking_uses_the_configured_slice_size() {
        let content = "z".repeat(config::SUMMARY_CHUNK_CHARS * 2 + 10);
        let chunks = SummaryClient::chunk(&content);
        assert_eq!(chunks.len(), 3);
        assert!(chunks
            .iter()
            .all(|c| c.chars().count() <= config::SUMMARY_CHUNK_CHARS));
    }

    #[tokio::test]
    async fn condensing_nothing_is_an_error() {
        let client = client_without_key();
        assert!(matches!(
            client.condense(&[]).await,
            Err(SummarizeError::NothingToCondense)
        ));
    }

    #[tokio::test]
    async fn missing_key_is_reported_before_any_call() {
        let client = client_without_key();
        assert!(matches!(
            client.summarize("text").await,
            Err(SummarizeError::MissingApiKey)
        ));
    }
}
