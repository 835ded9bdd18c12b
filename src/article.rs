//! Article content extraction.
//!
//! Structured parsing first (title metadata plus `<article>` paragraphs),
//! then a raw paragraph-scraping fallback over a fresh page download.

use crate::utils;
use once_cell::sync::Lazy;
use reqwest::Client as HttpClient;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{info, warn};

static OG_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid selector"));
static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("valid selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("valid selector"));

/// Errors from fetching the article page
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),
    /// The page answered with a non-success status
    #[error("page fetch returned status {0}")]
    Status(u16),
}

/// Title/body pair produced by extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub content: String,
}

/// Downloads article pages and derives a title/body pair from them
pub struct ArticleExtractor {
    client: HttpClient,
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: utils::create_http_client(),
        }
    }

    /// Extracts `{title, content}` from the page at `url`.
    ///
    /// Returns `None` when neither structured parsing nor the paragraph
    /// fallback yields any content. The title found by the structured pass
    /// (possibly empty) is kept for the fallback result.
    ///
    /// # Errors
    ///
    /// Returns an `ExtractError` if the primary fetch fails or answers with
    /// a non-success status. Fallback fetch problems only downgrade the
    /// result to `None`.
    pub async fn extract(&self, url: &str) -> Result<Option<ExtractedArticle>, ExtractError> {
        let response = self.fetch(url).await?;
        if !response.status().is_success() {
            return Err(ExtractError::Status(response.status().as_u16()));
        }
        let html = response
            .text()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        let (title, content) = parse_structured(&html);
        if !content.trim().is_empty() {
            info!("article content obtained via structured parsing");
            return Ok(Some(ExtractedArticle { title, content }));
        }

        // Fallback: scrape paragraph text from a fresh page download.
        let response = self.fetch(url).await?;
        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                "article content not obtained, fallback fetch rejected"
            );
            return Ok(None);
        }
        let raw = response
            .text()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        let content = paragraph_text(&raw);
        if content.trim().is_empty() {
            warn!("article content not obtained after paragraph scraping");
            return Ok(None);
        }
        info!("article content obtained via paragraph scraping");
        Ok(Some(ExtractedArticle { title, content }))
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response, ExtractError> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))
    }
}

/// Structured parse: title from `og:title` (falling back to `<title>`),
/// body from the paragraphs inside `<article>` elements.
#[must_use]
pub fn parse_structured(html: &str) -> (String, String) {
    let document = Html::parse_document(html);

    let title = document
        .select(&OG_TITLE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content").map(str::to_string))
        .or_else(|| {
            document
                .select(&TITLE_SELECTOR)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    let content = document
        .select(&ARTICLE_SELECTOR)
        .flat_map(|article| article.select(&PARAGRAPH_SELECTOR))
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    (title, content)
}

/// Fallback heuristic: the text of every `<p>` tag on the page.
#[must_use]
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&PARAGRAPH_SELECTOR)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_parse_reads_og_title_and_article_body() {
        let html = r#"<html><head>
            <title>Tab title</title>
            <meta property="og:title" content="Real headline"/>
            </head><body>
            <article><p>First.</p><p>Second.</p></article>
            <p>Footer text outside the article.</p>
            </body></html>"#;
        let (title, content) = parse_structured(html);
        assert_eq!(title, "Real headline");
        assert_eq!(content, "First.\nSecond.");
    }

    #[test]
    fn structured_parse_falls_back_to_title_tag() {
        let html = "<html><head><title>Tab title</title></head><body></body></html>";
        let (title, content) = parse_structured(html);
        assert_eq!(title, "Tab title");
        assert!(content.is_empty());
    }

    #[test]
    fn paragraph_fallback_concatenates_all_paragraphs() {
        let html = r#"<html><body>
            <div><p>One.</p></div>
            <p>Two.</p>
            <span>not a paragraph</span>
            </body></html>"#;
        assert_eq!(paragraph_text(html), "One.\nTwo.");
    }

    #[test]
    fn page_without_paragraphs_yields_nothing() {
        let html = "<html><body><div>plain div text</div></body></html>";
        let (title, content) = parse_structured(html);
        assert!(title.is_empty());
        assert!(content.is_empty());
        assert!(paragraph_text(html).is_empty());
    }
}
