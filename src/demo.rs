//! Offline stand-in for the generative model, used when no API key is set.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::data_uri::DataUri;
use crate::model::{GenerativeModel, Media, ModelError, ModelRequest, ModelResponse};

pub struct DemoModel;

fn items(input: &Value) -> Vec<String> {
    input["items"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn product_name(input: &Value) -> String {
    input["productName"].as_str().unwrap_or("Mystery Gadget").to_string()
}

/// "Apple" + "Car" -> "Carpple".
fn blend_name(items: &[String]) -> String {
    match items {
        [] => "Mystery Gadget".to_string(),
        [only] => only.clone(),
        [first, .., last] => {
            let tail: String = first.chars().skip(1).collect::<String>().to_lowercase();
            format!("{last}{tail}")
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn placeholder_image(title: &str, subtitle: &str, prompt: &str) -> String {
    let palette = ["#FF6FB5", "#7C5CFF", "#23D5AB", "#FFB020", "#3B82F6"];
    let color = palette[prompt.len() % palette.len()];
    let svg = format!(r#"<svg width="512" height="512" xmlns="http://www.w3.org/2000/svg">
            <defs>
                <linearGradient id="grad" x1="0%" y1="0%" x2="100%" y2="100%">
                    <stop offset="0%" style="stop-color:{color};stop-opacity:1" />
                    <stop offset="100%" style="stop-color:{color};stop-opacity:0.6" />
                </linearGradient>
            </defs>
            <rect width="512" height="512" rx="32" fill="url(#grad)" />
            <text x="256" y="240" font-family="Arial, sans-serif" font-size="36" font-weight="bold"
                  text-anchor="middle" fill="white">{}</text>
            <text x="256" y="290" font-family="Arial, sans-serif" font-size="16"
                  text-anchor="middle" fill="white" opacity="0.85">{}</text>
        </svg>"#, escape_xml(title), escape_xml(subtitle));
    DataUri::encode("image/svg+xml", svg.as_bytes())
}

#[async_trait]
impl GenerativeModel for DemoModel {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        info!(flow = request.flow, "Using demo mode - no real model call");
        let input = &request.input;
        let text = |value: Value| ModelResponse { text: Some(value.to_string()), media: None };
        let image = |url: String| ModelResponse { text: None, media: Some(Media { url }) };

        let response = match request.flow {
            "productName" => text(json!({ "productName": blend_name(&items(input)) })),
            "productFeatures" => {
                let items = items(input);
                let joined = items.join(" and ");
                let first = items.first().cloned().unwrap_or_default();
                text(json!({ "features": [
                    format!("Combines {joined} into one questionable package"),
                    format!("Smells faintly of {first} at all times"),
                    "Self-cleaning, but only when nobody is watching".to_string(),
                    "Comes with a complimentary existential crisis".to_string(),
                ] }))
            }
            "marketingSlogans" => {
                let name = product_name(input);
                text(json!({ "slogans": [
                    format!("{name}: because why not?"),
                    format!("You never knew you needed {name}."),
                    format!("{name}. Fused for your inconvenience."),
                ] }))
            }
            "productPoster" => image(placeholder_image(&product_name(input), "Now in Candy Pop", &request.prompt)),
            "featureImage" => {
                let feature = input["feature"].as_str().unwrap_or_default();
                image(placeholder_image(&product_name(input), feature, &request.prompt))
            }
            other => return Err(ModelError::Other(format!("demo model has no answer for flow {other}"))),
        };
        Ok(response)
    }
}
