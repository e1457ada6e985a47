//! Prompt flows: one call to the generative model per generation step.
//!
//! A flow renders its typed input into a prompt, sends it, and parses the
//! response into its typed output. Flows never retry and have no side
//! effects beyond the outbound call.

mod feature_image;
mod features;
mod name;
mod poster;
mod slogans;

pub use feature_image::{FeatureImageFlow, FeatureImageInput};
pub use features::{FeaturesFlow, FeaturesInput, FeaturesOutput};
pub use name::{NameFlow, NameInput, NameOutput};
pub use poster::{PosterFlow, PosterInput};
pub use slogans::{SlogansFlow, SlogansInput, SlogansOutput};

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::data_uri::{self, DataUri};
use crate::model::{GenerativeModel, ModelError, ModelRequest, OutputFormat};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{flow}: model returned no usable output")]
    NoOutput { flow: &'static str },
    #[error("{flow}: media is not a data URI: {reason}")]
    InvalidMedia { flow: &'static str, reason: String },
    #[error("{flow}: malformed structured output: {reason}")]
    Malformed { flow: &'static str, reason: String },
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A flow whose output is JSON text matching a declared schema.
pub trait PromptFlow {
    const NAME: &'static str;
    type Input: Serialize + Sync;
    type Output: DeserializeOwned;

    fn prompt(input: &Self::Input) -> String;

    /// Response schema in the Gemini OpenAPI subset.
    fn output_schema() -> Value;
}

/// A flow whose output is a single generated image.
pub trait ImageFlow {
    const NAME: &'static str;
    type Input: Serialize + Sync;

    fn prompt(input: &Self::Input) -> String;
}

/// Runs flows against one model client with a text and an image model id.
#[derive(Clone)]
pub struct Flows {
    model: Arc<dyn GenerativeModel>,
    text_model: String,
    image_model: String,
}

impl Flows {
    pub fn new(model: Arc<dyn GenerativeModel>, text_model: impl Into<String>, image_model: impl Into<String>) -> Self {
        Self { model, text_model: text_model.into(), image_model: image_model.into() }
    }

    pub async fn run<F: PromptFlow>(&self, input: &F::Input) -> Result<F::Output, FlowError> {
        let request = ModelRequest {
            flow: F::NAME,
            model: self.text_model.clone(),
            prompt: F::prompt(input),
            input: to_value(F::NAME, input)?,
            output: OutputFormat::Structured { schema: F::output_schema() },
        };
        let response = self.model.generate(request).await?;
        let text = response.text.ok_or(FlowError::NoOutput { flow: F::NAME })?;
        debug!(flow = F::NAME, "structured output: {}", text);
        serde_json::from_str(strip_code_fence(&text)).map_err(|e| {
            warn!(flow = F::NAME, "could not parse structured output: {}", e);
            FlowError::Malformed { flow: F::NAME, reason: e.to_string() }
        })
    }

    /// Returns the generated image as a data URI.
    pub async fn run_image<F: ImageFlow>(&self, input: &F::Input) -> Result<String, FlowError> {
        let request = ModelRequest {
            flow: F::NAME,
            model: self.image_model.clone(),
            prompt: F::prompt(input),
            input: to_value(F::NAME, input)?,
            output: OutputFormat::TextAndImage,
        };
        let media = self.model.generate(request).await?.media.ok_or(FlowError::NoOutput { flow: F::NAME })?;
        DataUri::parse(&media.url)
            .map_err(|e| FlowError::InvalidMedia { flow: F::NAME, reason: e.to_string() })?;
        debug!(flow = F::NAME, "image: {}", data_uri::preview(&media.url));
        Ok(media.url)
    }
}

fn to_value<T: Serialize>(flow: &'static str, input: &T) -> Result<Value, FlowError> {
    serde_json::to_value(input).map_err(|e| FlowError::Malformed { flow, reason: e.to_string() })
}

/// Models occasionally wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn bullet_list(items: &[String]) -> String {
    items.iter().map(|item| format!("- {item}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Media, ModelResponse};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Canned {
        response: ModelResponse,
        seen: Mutex<Vec<ModelRequest>>,
    }

    #[async_trait]
    impl GenerativeModel for Canned {
        async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            self.seen.lock().push(request);
            Ok(self.response.clone())
        }
    }

    fn flows_with(response: ModelResponse) -> (Flows, Arc<Canned>) {
        let model = Arc::new(Canned { response, seen: Mutex::new(Vec::new()) });
        (Flows::new(model.clone(), "text-model", "image-model"), model)
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn structured_flow_uses_text_model_and_schema() {
        let (flows, model) = flows_with(ModelResponse {
            text: Some(r#"{"productName":"Carpple"}"#.into()),
            media: None,
        });
        let input = NameInput { items: vec!["Apple".into(), "Car".into()] };
        let output = flows.run::<NameFlow>(&input).await.unwrap();
        assert_eq!(output.product_name, "Carpple");

        let seen = model.seen.lock();
        assert_eq!(seen[0].model, "text-model");
        assert_eq!(seen[0].input, json!({ "items": ["Apple", "Car"] }));
        assert!(matches!(seen[0].output, OutputFormat::Structured { .. }));
    }

    #[tokio::test]
    async fn missing_text_is_no_output() {
        let (flows, _) = flows_with(ModelResponse::default());
        let input = NameInput { items: vec!["Apple".into(), "Car".into()] };
        let err = flows.run::<NameFlow>(&input).await.unwrap_err();
        assert!(matches!(err, FlowError::NoOutput { flow: "productName" }));
    }

    #[tokio::test]
    async fn image_flow_requires_media() {
        let (flows, _) = flows_with(ModelResponse { text: Some("sorry".into()), media: None });
        let input = PosterInput { product_name: "Carpple".into(), slogan: None };
        let err = flows.run_image::<PosterFlow>(&input).await.unwrap_err();
        assert!(matches!(err, FlowError::NoOutput { flow: "productPoster" }));
    }

    #[tokio::test]
    async fn image_flow_rejects_remote_urls() {
        let (flows, _) = flows_with(ModelResponse {
            text: None,
            media: Some(Media { url: "https://cdn.example.com/poster.png".into() }),
        });
        let input = PosterInput { product_name: "Carpple".into(), slogan: None };
        let err = flows.run_image::<PosterFlow>(&input).await.unwrap_err();
        assert!(matches!(err, FlowError::InvalidMedia { .. }));
    }

    #[tokio::test]
    async fn image_flow_uses_image_model() {
        let (flows, model) = flows_with(ModelResponse {
            text: None,
            media: Some(Media { url: "data:image/png;base64,iVBORw0KGgo=".into() }),
        });
        let input = FeatureImageInput { product_name: "Carpple".into(), feature: "Self-peeling doors".into() };
        let uri = flows.run_image::<FeatureImageFlow>(&input).await.unwrap();
        assert_eq!(uri, "data:image/png;base64,iVBORw0KGgo=");
        let seen = model.seen.lock();
        assert_eq!(seen[0].model, "image-model");
        assert!(matches!(seen[0].output, OutputFormat::TextAndImage));
    }
}
