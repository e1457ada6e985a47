use serde::{Serialize, Deserialize};
use serde_with::skip_serializing_none;

use crate::error::FuseError;

pub const MIN_ITEMS: usize = 2;
pub const MAX_ITEMS: usize = 4;

/// The ingredients of one fusion: 2-4 trimmed, non-blank item names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionRequest {
    items: Vec<String>,
}

impl FusionRequest {
    /// Drops blank entries and trims the rest. Anything past the fourth
    /// ingredient is ignored.
    pub fn from_raw<S: AsRef<str>>(raw: &[S]) -> Result<Self, FuseError> {
        let items: Vec<String> = raw
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .take(MAX_ITEMS)
            .map(str::to_string)
            .collect();
        if items.len() < MIN_ITEMS {
            return Err(FuseError::Validation);
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn into_items(self) -> Vec<String> {
        self.items
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "FeatureRepr")]
pub struct Feature {
    pub text: String,
    /// Data URI of the feature illustration, or empty.
    pub image: String,
}

impl Feature {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), image: String::new() }
    }
}

/// Older saved fusions list features as bare strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureRepr {
    Full {
        text: String,
        #[serde(default)]
        image: String,
    },
    Text(String),
}

impl From<FeatureRepr> for Feature {
    fn from(repr: FeatureRepr) -> Self {
        match repr {
            FeatureRepr::Full { text, image } => Self { text, image },
            FeatureRepr::Text(text) => Self::text_only(text),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FusionResult {
    pub product_name: String,
    pub features: Vec<Feature>,
    pub slogans: Vec<String>,
    #[serde(default)]
    pub poster_data_uri: Option<String>,
}

impl FusionResult {
    /// Copy with every image payload removed.
    pub fn without_images(&self) -> Self {
        Self {
            product_name: self.product_name.clone(),
            features: self.features.iter().map(|f| Feature::text_only(f.text.clone())).collect(),
            slogans: self.slogans.clone(),
            poster_data_uri: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Creation timestamp (RFC 3339, millisecond precision).
    pub id: String,
    pub items: Vec<String>,
    #[serde(flatten)]
    pub result: FusionResult,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FuseRequestBody {
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PosterRequestBody {
    pub product_name: String,
    #[serde(default)]
    pub slogan: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Poster {
    pub poster_data_uri: String,
}
