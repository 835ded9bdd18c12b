//! Configuration and settings management
//!
//! Loads settings from environment variables and defines the fixed
//! parameters of the news/summary/image pipeline.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// News feed API key
    pub news_api_key: Option<String>,
    /// Hugging Face inference API key
    pub hf_api_key: Option<String>,
    /// Novita text-to-image API key
    pub novita_api_key: Option<String>,
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}

/// HTTP timeout for outbound service calls, in seconds.
///
/// Uses the `HTTP_TIMEOUT_SECS` environment variable or a 30s default.
pub fn get_http_timeout_secs() -> u64 {
    std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30)
}

// Headline fetch configuration
/// Country filter for the top-headlines lookup
pub const NEWS_COUNTRY: &str = "sg";
/// Language filter for the top-headlines lookup
pub const NEWS_LANGUAGE: &str = "en";
/// Number of headlines relayed per /fetchnews
pub const TOP_HEADLINES_LIMIT: usize = 5;

// Summarization configuration
/// Hosted inference model used for summarization
pub const SUMMARY_MODEL: &str = "facebook/bart-large-cnn";
/// Characters per summarization slice
pub const SUMMARY_CHUNK_CHARS: usize = 1024;
/// Upper bound on generated summary length, in model tokens
pub const SUMMARY_MAX_LENGTH: u32 = 150;
/// Lower bound on generated summary length, in model tokens
pub const SUMMARY_MIN_LENGTH: u32 = 30;

// Image generation configuration
/// Checkpoint used for text-to-image generation
pub const TXT2IMG_MODEL: &str = "sd_xl_base_1.0.safetensors";
/// Sampler passed to the image service
pub const TXT2IMG_SAMPLER: &str = "Euler a";
/// Classifier-free guidance scale
pub const TXT2IMG_CFG_SCALE: f64 = 7.5;
/// Fixed seed, so output is deterministic per prompt
pub const TXT2IMG_SEED: i64 = 103_304;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Env manipulation lives in a single test to avoid variable races
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("NEWS_API_KEY", "dummy_news_key");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.news_api_key, Some("dummy_news_key".to_string()));
        assert_eq!(settings.novita_api_key, None);

        // Empty env vars are treated as unset
        env::set_var("HF_API_KEY", "");
        let settings = Settings::new()?;
        assert_eq!(settings.hf_api_key, None);

        env::remove_var("TELEGRAM_TOKEN");
        env::remove_var("NEWS_API_KEY");
        env::remove_var("HF_API_KEY");
        Ok(())
    }

    #[test]
    fn test_http_timeout_default() {
        assert_eq!(get_http_timeout_secs(), 30);
    }
}
