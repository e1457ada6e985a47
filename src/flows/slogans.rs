use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{bullet_list, PromptFlow};

pub struct SlogansFlow;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlogansInput {
    pub product_name: String,
    /// Empty when slogans are generated alongside the features.
    pub product_features: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlogansOutput {
    #[serde(default)]
    pub slogans: Vec<String>,
}

impl PromptFlow for SlogansFlow {
    const NAME: &'static str = "marketingSlogans";
    type Input = SlogansInput;
    type Output = SlogansOutput;

    fn prompt(input: &SlogansInput) -> String {
        let mut prompt = format!(
            "You are a marketing expert who specializes in creating funny and engaging slogans.\n\nGenerate a list of funny marketing slogans for the following product:\n\nProduct Name: {}\n",
            input.product_name
        );
        if !input.product_features.is_empty() {
            prompt.push_str("Product Features:\n");
            prompt.push_str(&bullet_list(&input.product_features));
        }
        prompt
    }

    fn output_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "slogans": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "A list of funny marketing slogans."
                }
            },
            "required": ["slogans"]
        })
    }
}
