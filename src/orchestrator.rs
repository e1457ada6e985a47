//! End-to-end fuse pipeline.
//!
//! Name first (everything depends on it), then features and slogans, then the
//! optional image branches. Required branches fail the whole fuse; best-effort
//! branches degrade to an absent poster or empty feature images. Partial
//! results are never returned.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::data_uri::DataUri;
use crate::error::{FuseError, Step};
use crate::flows::{
    FeatureImageFlow, FeatureImageInput, FeaturesFlow, FeaturesInput, FlowError, Flows, NameFlow, NameInput,
    PosterFlow, PosterInput, SlogansFlow, SlogansInput,
};
use crate::models::{Feature, FusionRequest, FusionResult, Poster};

pub const MIN_FEATURES: usize = 3;
pub const MAX_FEATURES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOrder {
    /// Features and slogans concurrently; slogans do not see the features.
    Parallel,
    /// Features first, then slogans written from them.
    Sequential,
}

/// Failure policy of an optional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Required,
    BestEffort,
    /// Not run. For the poster this means deferred to `generate_poster`.
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuseOptions {
    pub text_steps: StepOrder,
    pub poster: Branch,
    /// Key the poster on the first slogan. When false the poster is
    /// generated concurrently with features and slogans.
    pub poster_slogan: bool,
    pub feature_images: Branch,
}

impl Default for FuseOptions {
    fn default() -> Self {
        Self {
            text_steps: StepOrder::Parallel,
            poster: Branch::Required,
            poster_slogan: true,
            feature_images: Branch::Required,
        }
    }
}

pub struct Orchestrator {
    flows: Flows,
    options: FuseOptions,
}

impl Orchestrator {
    pub fn new(flows: Flows, options: FuseOptions) -> Self {
        Self { flows, options }
    }

    pub fn options(&self) -> FuseOptions {
        self.options
    }

    /// Fuses 2-4 raw ingredient names into a validated product.
    ///
    /// Blank entries are dropped before anything else; with fewer than two
    /// left no model call is made.
    pub async fn fuse<S: AsRef<str>>(&self, items: &[S]) -> Result<FusionResult, FuseError> {
        let request = FusionRequest::from_raw(items)?;
        let span = info_span!("fuse", fuse_id = %Uuid::new_v4());
        let outcome = AssertUnwindSafe(self.run(&request).instrument(span.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(FuseError::Unexpected(panic_message(panic))));

        let _enter = span.enter();
        match &outcome {
            Ok(result) => info!(
                product = %result.product_name,
                features = result.features.len(),
                slogans = result.slogans.len(),
                poster = result.poster_data_uri.is_some(),
                "✅ Fusion complete"
            ),
            Err(err) => error!("❌ Fusion failed: {}", err),
        }
        outcome
    }

    /// Generates the poster on its own, for callers that deferred it.
    pub async fn generate_poster(&self, product_name: &str, slogan: Option<&str>) -> Result<Poster, FuseError> {
        let product_name = product_name.trim();
        if product_name.is_empty() {
            return Err(FuseError::MissingProductName);
        }
        let slogan = slogan.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let span = info_span!("poster", poster_id = %Uuid::new_v4());
        let outcome = AssertUnwindSafe(self.poster(product_name, slogan).instrument(span))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(FuseError::Unexpected(panic_message(panic))));
        if let Err(err) = &outcome {
            error!("❌ Poster generation failed: {}", err);
        }
        outcome.map(|poster_data_uri| Poster { poster_data_uri })
    }

    async fn run(&self, request: &FusionRequest) -> Result<FusionResult, FuseError> {
        let items = request.items();
        info!(?items, "🚀 Fusing ingredients");

        let product_name = self.product_name(items).await?;
        info!(product = %product_name, "🏷️ Product named");

        let text_steps = self.text_steps(items, &product_name);
        let ((features, slogans), early_poster) = if self.options.poster_slogan {
            (text_steps.await?, None)
        } else {
            let (text, poster) = tokio::join!(text_steps, self.poster_branch(&product_name, None));
            (text?, Some(poster?))
        };
        check_feature_count(features.len()).map_err(|detail| {
            error!("AI output validation error: {}", detail);
            FuseError::InvalidOutput(detail)
        })?;

        let late_poster = async {
            match early_poster {
                Some(poster) => Ok(poster),
                None => self.poster_branch(&product_name, slogans.first().cloned()).await,
            }
        };
        let (poster, images) = tokio::join!(late_poster, self.feature_images(&product_name, &features));
        let (poster_data_uri, images) = (poster?, images?);

        let result = FusionResult {
            product_name,
            features: features
                .into_iter()
                .zip(images)
                .map(|(text, image)| Feature { text, image })
                .collect(),
            slogans,
            poster_data_uri,
        };

        validate(&result).map_err(|detail| {
            error!("AI output validation error: {}", detail);
            FuseError::InvalidOutput(detail)
        })?;
        Ok(result)
    }

    async fn product_name(&self, items: &[String]) -> Result<String, FuseError> {
        let output = self
            .flows
            .run::<NameFlow>(&NameInput { items: items.to_vec() })
            .await
            .map_err(|e| flow_failure(Step::Name, e))?;
        let name = output.product_name.trim();
        if name.is_empty() {
            return Err(FuseError::StepFailed(Step::Name));
        }
        Ok(name.to_string())
    }

    async fn text_steps(&self, items: &[String], product_name: &str) -> Result<(Vec<String>, Vec<String>), FuseError> {
        let features_input = FeaturesInput { items: items.to_vec(), product_name: product_name.to_string() };
        match self.options.text_steps {
            StepOrder::Parallel => {
                let slogans_input = SlogansInput { product_name: product_name.to_string(), product_features: Vec::new() };
                let (features, slogans) = tokio::join!(self.features(&features_input), self.slogans(&slogans_input));
                Ok((features?, slogans?))
            }
            StepOrder::Sequential => {
                let features = self.features(&features_input).await?;
                let slogans_input = SlogansInput { product_name: product_name.to_string(), product_features: features.clone() };
                let slogans = self.slogans(&slogans_input).await?;
                Ok((features, slogans))
            }
        }
    }

    async fn features(&self, input: &FeaturesInput) -> Result<Vec<String>, FuseError> {
        let output = self.flows.run::<FeaturesFlow>(input).await.map_err(|e| flow_failure(Step::Features, e))?;
        non_empty(Step::Features, output.features)
    }

    async fn slogans(&self, input: &SlogansInput) -> Result<Vec<String>, FuseError> {
        let output = self.flows.run::<SlogansFlow>(input).await.map_err(|e| flow_failure(Step::Slogans, e))?;
        non_empty(Step::Slogans, output.slogans)
    }

    async fn poster(&self, product_name: &str, slogan: Option<String>) -> Result<String, FuseError> {
        let input = PosterInput { product_name: product_name.to_string(), slogan };
        self.flows.run_image::<PosterFlow>(&input).await.map_err(|e| flow_failure(Step::Poster, e))
    }

    async fn poster_branch(&self, product_name: &str, slogan: Option<String>) -> Result<Option<String>, FuseError> {
        optional_branch(self.options.poster, Step::Poster, || self.poster(product_name, slogan)).await
    }

    /// One image per feature, index-aligned. Empty strings when disabled or
    /// when a best-effort image fails.
    async fn feature_images(&self, product_name: &str, features: &[String]) -> Result<Vec<String>, FuseError> {
        let policy = self.options.feature_images;
        if policy == Branch::Off {
            return Ok(vec![String::new(); features.len()]);
        }
        let calls = features.iter().map(|feature| {
            let input = FeatureImageInput { product_name: product_name.to_string(), feature: feature.clone() };
            async move {
                let image = self.flows.run_image::<FeatureImageFlow>(&input).await;
                image.map_err(|e| flow_failure(Step::FeatureImages, e))
            }
        });
        join_all(calls)
            .await
            .into_iter()
            .map(|image| match (image, policy) {
                (Ok(uri), _) => Ok(uri),
                (Err(err), Branch::BestEffort) => {
                    warn!("feature image skipped: {}", err);
                    Ok(String::new())
                }
                (Err(err), _) => Err(err),
            })
            .collect()
    }
}

async fn optional_branch<T, F, Fut>(policy: Branch, step: Step, call: F) -> Result<Option<T>, FuseError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FuseError>>,
{
    match policy {
        Branch::Off => Ok(None),
        Branch::Required => call().await.map(Some),
        Branch::BestEffort => match call().await {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("{} skipped: {}", step, err);
                Ok(None)
            }
        },
    }
}

/// Trims entries and drops blank ones; an empty remainder fails the step.
fn non_empty(step: Step, values: Vec<String>) -> Result<Vec<String>, FuseError> {
    let values: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(FuseError::StepFailed(step));
    }
    Ok(values)
}

/// Missing content is a step failure; transport and parse problems are unexpected.
fn flow_failure(step: Step, err: FlowError) -> FuseError {
    warn!("{} flow failed: {}", step, err);
    match err {
        FlowError::NoOutput { .. } | FlowError::InvalidMedia { .. } => FuseError::StepFailed(step),
        FlowError::Malformed { .. } | FlowError::Model(_) => FuseError::Unexpected(err.to_string()),
    }
}

/// Structural check of the assembled aggregate.
fn check_feature_count(count: usize) -> Result<(), String> {
    if (MIN_FEATURES..=MAX_FEATURES).contains(&count) {
        Ok(())
    } else {
        Err(format!("features: expected {MIN_FEATURES}-{MAX_FEATURES}, got {count}"))
    }
}

pub fn validate(result: &FusionResult) -> Result<(), String> {
    if result.product_name.trim().is_empty() {
        return Err("productName is empty".into());
    }
    check_feature_count(result.features.len())?;
    for (i, feature) in result.features.iter().enumerate() {
        if feature.text.trim().is_empty() {
            return Err(format!("features[{i}].text is empty"));
        }
        if !feature.image.is_empty() {
            DataUri::parse(&feature.image).map_err(|e| format!("features[{i}].image: {e}"))?;
        }
    }
    if result.slogans.is_empty() {
        return Err("slogans is empty".into());
    }
    if let Some(i) = result.slogans.iter().position(|s| s.trim().is_empty()) {
        return Err(format!("slogans[{i}] is empty"));
    }
    if let Some(poster) = &result.poster_data_uri {
        DataUri::parse(poster).map_err(|e| format!("posterDataUri: {e}"))?;
    }
    Ok(())
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
