//! Clients for the two generative APIs the pipeline talks to.
//!
//! Both sit behind a small trait so the pipeline and its tests can swap in
//! other implementations.

use async_trait::async_trait;

pub mod gemini;
pub mod stability;

/// Errors returned by the provider clients.
#[derive(Debug)]
pub enum ProviderError {
    /// No API key was configured for this provider.
    NotConfigured(&'static str),
    /// The HTTP request could not be built or sent.
    Request(reqwest::Error),
    /// The provider answered with a non-success status.
    Status(reqwest::StatusCode, String),
    /// The provider answered with something we could not parse.
    Decode(String),
    /// The provider answered successfully but without content.
    Empty(&'static str),
    /// The provider refused to render the request.
    Filtered(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured(provider) => write!(f, "{provider} API key is not configured"),
            Self::Request(err) => write!(f, "Request failed: {err}"),
            Self::Status(status, body) => write!(f, "Provider returned {status}: {body}"),
            Self::Decode(message) => write!(f, "Failed to decode provider response: {message}"),
            Self::Empty(what) => write!(f, "Provider response had no {what}"),
            Self::Filtered(reason) => write!(f, "Provider filtered the request: {reason}"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err)
    }
}

/// Turns a learning-objective prompt into a comic script.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Returns the raw script text.
    async fn generate_script(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Turns a scene description into encoded image bytes.
#[async_trait]
pub trait PanelImageGenerator: Send + Sync {
    /// Returns the encoded image (PNG or JPEG).
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Keeps error bodies short enough to log.
pub(crate) fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 500;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
