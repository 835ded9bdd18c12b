//! Text-to-image service client.
//!
//! Submits a txt2img task with a fixed sampler, checkpoint and seed, polls
//! the progress endpoint until a terminal state, then downloads the result
//! and re-encodes it to JPEG in memory.

use crate::config;
use crate::config::Settings;
use crate::utils;
use image::ImageFormat;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const TXT2IMG_URL: &str = "https://api.novita.ai/v2/txt2img";
const PROGRESS_URL: &str = "https://api.novita.ai/v2/progress";

// Terminal task states reported by the progress endpoint
const STATUS_SUCCESSFUL: i32 = 2;
const STATUS_FAILED: i32 = 3;
const STATUS_TIMED_OUT: i32 = 4;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Errors from image generation
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// No image API key was configured
    #[error("image API key is not configured")]
    MissingApiKey,
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),
    /// The service rejected the request or answered malformed
    #[error("image API error: {0}")]
    Api(String),
    /// The task reached a failed state; carries the service's reason verbatim
    #[error("Failed to generate an image with error: {0}")]
    Generation(String),
    /// The returned bytes could not be decoded or re-encoded
    #[error("image decoding failed: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    data: Option<SubmitData>,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct ProgressResponse {
    data: ProgressData,
}

#[derive(Debug, Deserialize)]
struct ProgressData {
    status: i32,
    #[serde(default)]
    imgs: Option<Vec<String>>,
    #[serde(default)]
    failed_reason: Option<String>,
}

/// Client for the external text-to-image service
pub struct ImageClient {
    client: HttpClient,
    api_key: Option<String>,
}

impl ImageClient {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: utils::create_http_client(),
            api_key: settings.novita_api_key.clone(),
        }
    }

    /// Generates one illustration for `prompt` and returns it as JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns an `ImageGenError` if the key is missing, a call fails, the
    /// task ends in a failed state, or the image bytes cannot be re-encoded.
    pub async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageGenError> {
        let api_key = self.api_key.as_deref().ok_or(ImageGenError::MissingApiKey)?;

        let task_id = self.submit(api_key, prompt).await?;
        debug!(%task_id, "txt2img task submitted");

        let result = self.wait_for_result(api_key, &task_id).await?;
        let url = result
            .imgs
            .as_ref()
            .and_then(|imgs| imgs.first())
            .ok_or_else(|| ImageGenError::Api("successful task carried no image".to_string()))?;

        let bytes = self.download(url).await?;
        reencode_jpeg(&bytes)
    }

    async fn submit(&self, api_key: &str, prompt: &str) -> Result<String, ImageGenError> {
        let body = json!({
            "prompt": prompt,
            "batch_size": 1,
            "cfg_scale": config::TXT2IMG_CFG_SCALE,
            "sampler_name": config::TXT2IMG_SAMPLER,
            "model_name": config::TXT2IMG_MODEL,
            "seed": config::TXT2IMG_SEED,
        });

        let response = self
            .client
            .post(TXT2IMG_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageGenError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let truncated: String = text.chars().take(500).collect();
            return Err(ImageGenError::Api(format!("{status} - {truncated}")));
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::Api(e.to_string()))?;

        submit.data.map(|d| d.task_id).ok_or_else(|| {
            ImageGenError::Api(
                submit
                    .msg
                    .unwrap_or_else(|| "submit response carried no task id".to_string()),
            )
        })
    }

    async fn wait_for_result(
        &self,
        api_key: &str,
        task_id: &str,
    ) -> Result<ProgressData, ImageGenError> {
        loop {
            let response = self
                .client
                .get(PROGRESS_URL)
                .query(&[("task_id", task_id)])
                .bearer_auth(api_key)
                .send()
                .await
                .map_err(|e| ImageGenError::Network(e.to_string()))?;

            if !response.status().is_success() {
                return Err(ImageGenError::Api(format!(
                    "progress poll returned {}",
                    response.status()
                )));
            }

            let progress: ProgressResponse = response
                .json()
                .await
                .map_err(|e| ImageGenError::Api(e.to_string()))?;

            match progress.data.status {
                STATUS_SUCCESSFUL => return Ok(progress.data),
                STATUS_FAILED | STATUS_TIMED_OUT => {
                    let reason = progress
                        .data
                        .failed_reason
                        .unwrap_or_else(|| "unknown".to_string());
                    return Err(ImageGenError::Generation(reason));
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageGenError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageGenError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageGenError::Api(format!(
                "image download returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ImageGenError::Network(e.to_string()))
    }
}

/// Decodes raw image bytes and re-encodes them as JPEG in memory.
///
/// JPEG has no alpha channel, so the decoded image is flattened to RGB first.
///
/// # Errors
///
/// Returns `ImageGenError::Decode` if the bytes are not a decodable image or
/// the encode fails.
pub fn reencode_jpeg(bytes: &[u8]) -> Result<Vec<u8>, ImageGenError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| ImageGenError::Decode(e.to_string()))?;

    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(decoded.to_rgb8())
        .write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| ImageGenError::Decode(e.to_string()))?;

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_fixture() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([12, 180, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .expect("png encode should succeed");
        out.into_inner()
    }

    #[test]
    fn reencodes_png_bytes_to_valid_jpeg() {
        let jpeg = reencode_jpeg(&png_fixture()).expect("re-encode should succeed");
        // JPEG SOI marker
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&jpeg).expect("format should be recognized"),
            ImageFormat::Jpeg
        );
        let decoded = image::load_from_memory(&jpeg).expect("jpeg should decode");
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 8);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        assert!(matches!(
            reencode_jpeg(b"definitely not an image"),
            Err(ImageGenError::Decode(_))
        ));
    }

    #[test]
    fn generation_failure_embeds_the_reason_verbatim() {
        let err = ImageGenError::Generation("NSFW content detected".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to generate an image with error: NSFW content detected"
        );
    }

    #[test]
    fn progress_response_deserializes_terminal_states() {
        let success: ProgressResponse = serde_json::from_str(
            r#"{"data": {"status": 2, "imgs": ["https://cdn.example.com/i.png"]}}"#,
        )
        .expect("success payload should deserialize");
        assert_eq!(success.data.status, STATUS_SUCCESSFUL);

        let failed: ProgressResponse =
            serde_json::from_str(r#"{"data": {"status": 3, "failed_reason": "model not found"}}"#)
                .expect("failed payload should deserialize");
        assert_eq!(failed.data.status, STATUS_FAILED);
        assert_eq!(failed.data.failed_reason.as_deref(), Some("model not found"));
    }
}
