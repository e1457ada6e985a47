use serde::Serialize;

use super::ImageFlow;

pub struct PosterFlow;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterInput {
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slogan: Option<String>,
}

impl ImageFlow for PosterFlow {
    const NAME: &'static str = "productPoster";
    type Input = PosterInput;

    fn prompt(input: &PosterInput) -> String {
        let slogan = match input.slogan.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => format!(" with the slogan: \"{s}\""),
            _ => String::new(),
        };
        format!(
            "Generate a fun, eye-catching product poster in a playful 'Candy Pop' UI style for a product called \"{}\"{slogan}.",
            input.product_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn slogan_is_folded_in_when_present() {
        let prompt = PosterFlow::prompt(&PosterInput {
            product_name: "Carpple".into(),
            slogan: Some("Drive fresh.".into()),
        });
        assert!(prompt.ends_with("called \"Carpple\" with the slogan: \"Drive fresh.\"."));
    }

    #[test]
    fn blank_slogan_is_ignored() {
        let with_blank = PosterFlow::prompt(&PosterInput { product_name: "Carpple".into(), slogan: Some("  ".into()) });
        let without = PosterFlow::prompt(&PosterInput { product_name: "Carpple".into(), slogan: None });
        assert_eq!(with_blank, without);
    }
}
