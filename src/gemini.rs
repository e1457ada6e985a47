use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::data_uri::{self, DataUri};
use crate::model::{GenerativeModel, Media, ModelError, ModelRequest, ModelResponse, OutputFormat};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// Helper function to truncate base64 data in JSON for cleaner logging
fn truncate_base64_in_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let Value::String(s) = val {
                        if s.len() > 100 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=') {
                            *val = Value::String(format!("{}...[truncated {} chars]", data_uri::head(s, 50), s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

fn loggable(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(mut value) => {
            truncate_base64_in_json(&mut value);
            value.to_string()
        }
        Err(_) if body.chars().count() > 1000 => format!("{}...", data_uri::head(body, 1000)),
        Err(_) => body.to_string(),
    }
}

/// REST client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn request_body(request: &ModelRequest) -> Value {
        let generation_config = match &request.output {
            OutputFormat::Structured { schema } => json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
                "temperature": 0.9,
                "candidateCount": 1
            }),
            OutputFormat::TextAndImage => json!({
                "responseModalities": ["TEXT", "IMAGE"],
                "temperature": 0.4,
                "topP": 0.95,
                "topK": 64,
                "candidateCount": 1
            }),
        };
        json!({
            "contents": [{
                "parts": [{"text": request.prompt}]
            }],
            "generationConfig": generation_config
        })
    }

    async fn perform_api_call(&self, request: &ModelRequest) -> Result<GeminiResponse, ModelError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = Self::request_body(request);

        info!(flow = request.flow, model = %request.model, "🔗 Calling Gemini");
        debug!("📤 Request body: {}", body);

        let response = self.client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Http(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await
            .map_err(|e| ModelError::Http(e.to_string()))?;

        if !status.is_success() {
            error!(flow = request.flow, "❌ Gemini API error {}: {}", status, loggable(&response_text));
            return Err(ModelError::Http(format!("status={} body={}", status, response_text)));
        }

        debug!("📥 Raw Gemini API response: {}", loggable(&response_text));

        serde_json::from_str(&response_text)
            .map_err(|e| ModelError::Parse(format!("{}: {}", e, loggable(&response_text))))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let parsed = self.perform_api_call(&request).await?;
        let response = ModelResponse {
            text: extract_text(&parsed),
            media: extract_first_image(&parsed),
        };
        match &response.media {
            Some(media) => info!(flow = request.flow, "🖼️ Extracted image: {}", data_uri::preview(&media.url)),
            None if matches!(request.output, OutputFormat::TextAndImage) => {
                warn!(flow = request.flow, "⚠️ No image data found in API response")
            }
            None => {}
        }
        Ok(response)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData
    },
    Text { text: String },
    #[allow(dead_code)]
    Other(Value)
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
}

fn extract_text(resp: &GeminiResponse) -> Option<String> {
    let candidate = resp.candidates.first()?;
    let text: String = candidate.content.parts.iter()
        .filter_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn extract_first_image(resp: &GeminiResponse) -> Option<Media> {
    for c in &resp.candidates {
        for p in &c.content.parts {
            if let Part::Inline { inline_data } = p {
                let mime_type = if inline_data.mime_type.is_empty() {
                    data_uri::sniff_mime_type(&inline_data.data).unwrap_or("image/png")
                } else {
                    inline_data.mime_type.as_str()
                };
                return Some(Media { url: DataUri::from_base64(mime_type, &inline_data.data) });
            }
        }
    }
    None
}
