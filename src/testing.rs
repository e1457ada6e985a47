//! Scripted model double for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::model::{GenerativeModel, Media, ModelError, ModelRequest, ModelResponse};

pub(crate) const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Answers each flow from fixed fields and records every request.
pub(crate) struct ScriptedModel {
    pub name: String,
    pub features: Vec<String>,
    pub slogans: Vec<String>,
    pub poster: Option<String>,
    pub feature_image: Option<String>,
    /// Flow that fails with a transport error.
    pub fail_flow: Option<&'static str>,
    pub panic_flow: Option<&'static str>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn happy() -> Self {
        Self {
            name: "Carpple".into(),
            features: vec![
                "Self-peeling doors".into(),
                "Vitamin-C exhaust".into(),
                "Core-powered engine".into(),
            ],
            slogans: vec!["An apple a day keeps the mechanic away.".into(), "Drive fresh.".into()],
            poster: Some(PNG_URI.into()),
            feature_image: Some(PNG_URI.into()),
            fail_flow: None,
            panic_flow: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }

    pub fn flows(&self) -> Vec<&'static str> {
        self.requests.lock().iter().map(|r| r.flow).collect()
    }

    pub fn count(&self, flow: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.flow == flow).count()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let flow = request.flow;
        self.requests.lock().push(request);
        if self.panic_flow == Some(flow) {
            panic!("scripted panic in {flow}");
        }
        if self.fail_flow == Some(flow) {
            return Err(ModelError::Http("connection reset".into()));
        }
        let text = |value: serde_json::Value| ModelResponse { text: Some(value.to_string()), media: None };
        let media = |url: &Option<String>| ModelResponse {
            text: None,
            media: url.clone().map(|url| Media { url }),
        };
        Ok(match flow {
            "productName" => text(json!({ "productName": self.name })),
            "productFeatures" => text(json!({ "features": self.features })),
            "marketingSlogans" => text(json!({ "slogans": self.slogans })),
            "productPoster" => media(&self.poster),
            "featureImage" => media(&self.feature_image),
            other => return Err(ModelError::Other(format!("unscripted flow {other}"))),
        })
    }
}
