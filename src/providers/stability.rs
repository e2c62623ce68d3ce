//! Panel images from the Stability AI stable-image API.
//!
//! Docs: <https://platform.stability.ai/docs/api-reference#tag/Generate/paths/~1v2beta~1stable-image~1generate~1core/post>

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;
use serde::Deserialize;
use tracing::debug;

use super::{PanelImageGenerator, ProviderError, truncate_body};
use crate::constants::IMAGE_REQUEST_TIMEOUT_SECONDS;

/// v2beta answers with `image`, the older v1 endpoints with `artifacts`.
#[derive(Deserialize, Debug)]
struct GenerateImageResponse {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Deserialize, Debug)]
struct Artifact {
    #[serde(default)]
    base64: Option<String>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

/// Stability REST client.
#[derive(Clone, Debug)]
pub struct StabilityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl StabilityClient {
    /// Builds a client; without a key every request fails and the pipeline
    /// falls back to the placeholder.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(IMAGE_REQUEST_TIMEOUT_SECONDS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

/// Decodes a base64 payload, tolerating a `data:image/png;base64,` prefix.
pub(crate) fn decode_base64_image(payload: &str) -> Result<Vec<u8>, ProviderError> {
    let payload = match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    };
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| ProviderError::Decode(format!("invalid base64 image: {err}")))
}

fn image_bytes(parsed: GenerateImageResponse) -> Result<Vec<u8>, ProviderError> {
    let filtered = |reason: &Option<String>| {
        reason
            .as_deref()
            .is_some_and(|reason| reason.eq_ignore_ascii_case("CONTENT_FILTERED"))
    };

    if filtered(&parsed.finish_reason) {
        return Err(ProviderError::Filtered("CONTENT_FILTERED".to_string()));
    }
    if let Some(image) = parsed.image {
        return decode_base64_image(&image);
    }

    let artifact = parsed
        .artifacts
        .into_iter()
        .next()
        .ok_or(ProviderError::Empty("image artifacts"))?;
    if filtered(&artifact.finish_reason) {
        return Err(ProviderError::Filtered("CONTENT_FILTERED".to_string()));
    }
    let encoded = artifact
        .base64
        .ok_or(ProviderError::Empty("artifact image data"))?;
    decode_base64_image(&encoded)
}

#[async_trait]
impl PanelImageGenerator for StabilityClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("Stability"))?;

        // content-type must be multipart/form-data
        let form = reqwest::multipart::Form::new()
            .text("prompt", prompt.to_string())
            .text("output_format", "png")
            .text("aspect_ratio", "2:3");

        let resp = self
            .client
            .post(format!(
                "{}/v2beta/stable-image/generate/core",
                self.base_url
            ))
            .bearer_auth(api_key)
            .header("accept", "application/json")
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        debug!("Stability response status: {status}");
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(ProviderError::Status(
                status,
                truncate_body(&String::from_utf8_lossy(&bytes)),
            ));
        }

        let parsed: GenerateImageResponse = serde_json::from_slice(&bytes)
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        image_bytes(parsed)
    }
}
