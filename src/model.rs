use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("parse error: {0}")] Parse(String),
    #[error("Other: {0}")] Other(String),
}

/// What the caller wants back from the model.
#[derive(Debug, Clone)]
pub enum OutputFormat {
    /// JSON text constrained by a response schema.
    Structured { schema: Value },
    /// Text and image modalities together. Image-only is not supported by
    /// the image models, so it is never requested.
    TextAndImage,
}

#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Flow name, for logging and offline models.
    pub flow: &'static str,
    pub model: String,
    pub prompt: String,
    /// The flow's input object as JSON.
    pub input: Value,
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub media: Option<Media>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    /// `data:<mimetype>;base64,<payload>`
    pub url: String,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}
