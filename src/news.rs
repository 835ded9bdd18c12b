//! News feed client for the top-headlines lookup.

use crate::config;
use crate::config::Settings;
use crate::utils;
use chrono::NaiveDateTime;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const TOP_HEADLINES_URL: &str = "https://newsapi.org/v2/top-headlines";

/// Errors from the news feed lookup
#[derive(Debug, Error)]
pub enum NewsError {
    /// No news API key was configured
    #[error("news API key is not configured")]
    MissingApiKey,
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),
    /// The feed answered with a non-ok status
    #[error("news API error: {0}")]
    Api(String),
    /// The feed answered ok but carried no articles
    #[error("no articles found in the response")]
    NoArticles,
}

/// One article as returned by the feed
#[derive(Debug, Clone, Deserialize)]
pub struct Headline {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(rename = "publishedAt", default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Headline>,
}

/// Client for the external news feed
pub struct NewsClient {
    client: HttpClient,
    api_key: Option<String>,
}

impl NewsClient {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: utils::create_http_client(),
            api_key: settings.news_api_key.clone(),
        }
    }

    /// Top headlines for the fixed country/language filter.
    ///
    /// # Errors
    ///
    /// Returns a `NewsError` if the key is missing, the call fails, the feed
    /// reports a non-ok status, or no articles come back.
    pub async fn top_headlines(&self) -> Result<Vec<Headline>, NewsError> {
        let api_key = self.api_key.as_deref().ok_or(NewsError::MissingApiKey)?;

        let response = self
            .client
            .get(TOP_HEADLINES_URL)
            .query(&[
                ("country", config::NEWS_COUNTRY),
                ("language", config::NEWS_LANGUAGE),
            ])
            .header("X-Api-Key", api_key)
            .send()
            .await
            .map_err(|e| NewsError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let truncated: String = text.chars().take(500).collect();
            return Err(NewsError::Api(format!("{status} - {truncated}")));
        }

        let body: HeadlinesResponse = response
            .json()
            .await
            .map_err(|e| NewsError::Api(e.to_string()))?;

        let articles = successful_articles(body)?;
        debug!(count = articles.len(), "fetched top headlines");
        Ok(articles)
    }
}

fn successful_articles(body: HeadlinesResponse) -> Result<Vec<Headline>, NewsError> {
    if body.status != "ok" {
        let detail = body
            .message
            .or(body.code)
            .unwrap_or_else(|| "unknown".to_string());
        return Err(NewsError::Api(detail));
    }
    if body.articles.is_empty() {
        return Err(NewsError::NoArticles);
    }
    Ok(body.articles)
}

/// Reformats the feed's `publishedAt` timestamp for display.
///
/// Unparsable values fall back to the raw string rather than failing
/// the whole message.
#[must_use]
pub fn format_published_at(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ")
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
