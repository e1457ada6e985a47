use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

/// A generation step of the fuse pipeline, used to name which step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Name,
    Features,
    Slogans,
    Poster,
    FeatureImages,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Step::Name => "name",
            Step::Features => "features",
            Step::Slogans => "slogans",
            Step::Poster => "poster",
            Step::FeatureImages => "feature images",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FuseError {
    #[error("fewer than two non-blank ingredients")]
    Validation,
    #[error("poster requested without a product name")]
    MissingProductName,
    #[error("{0} generation failed")]
    StepFailed(Step),
    #[error("invalid AI output: {0}")]
    InvalidOutput(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl FuseError {
    /// Wording shown to end users. Internal detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            FuseError::Validation => "Please provide at least two ingredients to fuse.",
            FuseError::MissingProductName => "Please provide a product name for the poster.",
            FuseError::StepFailed(Step::Name) => "Could not generate a product name.",
            FuseError::StepFailed(Step::Features) => "Could not generate product features.",
            FuseError::StepFailed(Step::Slogans) => "Could not generate marketing slogans.",
            FuseError::StepFailed(Step::Poster) => "Could not generate a product poster.",
            FuseError::StepFailed(Step::FeatureImages) => "Could not generate feature images.",
            FuseError::InvalidOutput(_) => "Received invalid data from AI. Please try again.",
            FuseError::Unexpected(_) => {
                "An unexpected error occurred while generating the product. Please try again later."
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            FuseError::Validation | FuseError::MissingProductName => StatusCode::BAD_REQUEST,
            FuseError::StepFailed(_) | FuseError::InvalidOutput(_) => StatusCode::BAD_GATEWAY,
            FuseError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The `{ "error": "..." }` half of the envelope returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl From<&FuseError> for ErrorEnvelope {
    fn from(err: &FuseError) -> Self {
        Self { error: err.user_message().to_string() }
    }
}

impl IntoResponse for FuseError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorEnvelope::from(&self))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    Invalid { key: &'static str, value: String, expected: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failures_name_the_step() {
        assert_eq!(
            FuseError::StepFailed(Step::Slogans).user_message(),
            "Could not generate marketing slogans."
        );
        assert_eq!(FuseError::StepFailed(Step::Poster).to_string(), "poster generation failed");
    }

    #[test]
    fn internal_detail_is_not_in_user_message() {
        let err = FuseError::InvalidOutput("features: expected 3-5, got 7".into());
        assert!(!err.user_message().contains("expected"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(FuseError::Validation.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn envelope_carries_only_the_message() {
        let body = serde_json::to_value(ErrorEnvelope::from(&FuseError::Unexpected("socket closed".into()))).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "error": "An unexpected error occurred while generating the product. Please try again later."
            })
        );
    }
}
