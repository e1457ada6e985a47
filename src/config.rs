use std::path::PathBuf;

use crate::error::ConfigError;
use crate::gemini::DEFAULT_API_BASE;
use crate::orchestrator::{Branch, FuseOptions, StepOrder};

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the offline demo model.
    pub api_key: Option<String>,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub fuse: FuseOptions,
    pub history_dir: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let text_steps = match var("FUSICIAN_TEXT_STEPS").as_deref() {
            None | Some("parallel") => StepOrder::Parallel,
            Some("sequential") => StepOrder::Sequential,
            Some(other) => return Err(invalid("FUSICIAN_TEXT_STEPS", other, "parallel|sequential")),
        };
        let poster = match var("FUSICIAN_POSTER").as_deref() {
            None | Some("required") => Branch::Required,
            Some("best-effort") => Branch::BestEffort,
            Some("deferred") => Branch::Off,
            Some(other) => return Err(invalid("FUSICIAN_POSTER", other, "required|best-effort|deferred")),
        };
        let feature_images = match var("FUSICIAN_FEATURE_IMAGES").as_deref() {
            None | Some("required") => Branch::Required,
            Some("best-effort") => Branch::BestEffort,
            Some("off") => Branch::Off,
            Some(other) => return Err(invalid("FUSICIAN_FEATURE_IMAGES", other, "required|best-effort|off")),
        };
        let poster_slogan = match var("FUSICIAN_POSTER_SLOGAN").as_deref() {
            None | Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => return Err(invalid("FUSICIAN_POSTER_SLOGAN", other, "true|false")),
        };
        let port = match var("PORT") {
            None => 8080,
            Some(raw) => raw.parse::<u16>().map_err(|_| invalid("PORT", &raw, "a port number"))?,
        };

        Ok(Self {
            api_key: var("GEMINI_API_KEY").filter(|k| k != "DEMO_KEY"),
            api_base: var("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            text_model: var("FUSICIAN_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: var("FUSICIAN_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            fuse: FuseOptions { text_steps, poster, poster_slogan, feature_images },
            history_dir: var("FUSICIAN_HISTORY_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./data")),
            port,
        })
    }

    /// API key for logging: first few characters only.
    pub fn masked_key(&self) -> String {
        match &self.api_key {
            Some(key) => format!("{}...", key.chars().take(6).collect::<String>()),
            None => "<none, demo mode>".to_string(),
        }
    }
}

fn invalid(key: &'static str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::Invalid { key, value: value.to_string(), expected }
}
