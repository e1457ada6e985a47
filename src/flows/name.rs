use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{bullet_list, PromptFlow};

pub struct NameFlow;

#[derive(Debug, Clone, Serialize)]
pub struct NameInput {
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameOutput {
    #[serde(default)]
    pub product_name: String,
}

impl PromptFlow for NameFlow {
    const NAME: &'static str = "productName";
    type Input = NameInput;
    type Output = NameOutput;

    fn prompt(input: &NameInput) -> String {
        format!(
            "You are a creative product naming expert. Given a list of ingredients, generate a quirky and funny product name that combines the essence of all items.\n\nIngredients:\n{}\nProduct Name:",
            bullet_list(&input.items)
        )
    }

    fn output_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "productName": { "type": "STRING", "description": "The generated quirky product name." }
            },
            "required": ["productName"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_ingredient() {
        let prompt = NameFlow::prompt(&NameInput { items: vec!["Apple".into(), "Car".into(), "Kazoo".into()] });
        assert!(prompt.contains("- Apple\n- Car\n- Kazoo\n"));
        assert!(prompt.ends_with("Product Name:"));
    }

    #[test]
    fn missing_name_parses_as_empty() {
        let output: NameOutput = serde_json::from_str("{}").unwrap();
        assert!(output.product_name.is_empty());
    }
}
