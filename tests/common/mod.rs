use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use fusician::demo::DemoModel;
use fusician::flows::Flows;
use fusician::history::{HistoryStore, MemoryStore};
use fusician::model::{GenerativeModel, ModelError, ModelRequest, ModelResponse};
use fusician::orchestrator::{FuseOptions, Orchestrator};
use fusician::{build_router, AppState};

/// Demo model that records which flows were called and can refuse one.
pub struct RecordingModel {
    pub calls: Mutex<Vec<&'static str>>,
    pub refuse: Option<&'static str>,
}

impl RecordingModel {
    pub fn new(refuse: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), refuse })
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl GenerativeModel for RecordingModel {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.calls.lock().push(request.flow);
        if self.refuse == Some(request.flow) {
            return Ok(ModelResponse::default());
        }
        DemoModel.generate(request).await
    }
}

pub fn app(model: Arc<RecordingModel>, options: FuseOptions) -> Router {
    let flows = Flows::new(model, "text-model", "image-model");
    let history = HistoryStore::open(Box::<MemoryStore>::default());
    build_router(AppState::new(Orchestrator::new(flows, options), history))
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, json)
}
