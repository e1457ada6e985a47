use serde::Serialize;

use super::ImageFlow;

pub struct FeatureImageFlow;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureImageInput {
    pub product_name: String,
    pub feature: String,
}

impl ImageFlow for FeatureImageFlow {
    const NAME: &'static str = "featureImage";
    type Input = FeatureImageInput;

    fn prompt(input: &FeatureImageInput) -> String {
        format!(
            "Generate a fun, slightly absurd, visual representation of a product feature. The product is called \"{}\". The feature is: \"{}\". The image should be vibrant and eye-catching, in a playful, 'Candy Pop' UI style.",
            input.product_name, input.feature
        )
    }
}
