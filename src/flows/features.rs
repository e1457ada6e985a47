use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{bullet_list, PromptFlow};

pub struct FeaturesFlow;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesInput {
    pub items: Vec<String>,
    pub product_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesOutput {
    #[serde(default)]
    pub features: Vec<String>,
}

impl PromptFlow for FeaturesFlow {
    const NAME: &'static str = "productFeatures";
    type Input = FeaturesInput;
    type Output = FeaturesOutput;

    fn prompt(input: &FeaturesInput) -> String {
        format!(
            "You are a creative product feature generator. Given a list of ingredients and the product name, generate 3-5 funny and imaginative, yet plausible, features for the fused product.\n\nIngredients:\n{}Product Name: {}\n\nFeatures:",
            bullet_list(&input.items),
            input.product_name
        )
    }

    fn output_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "features": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "minItems": 3,
                    "maxItems": 5,
                    "description": "An array of 3-5 funny and imaginative product features."
                }
            },
            "required": ["features"]
        })
    }
}
