pub mod orchestrator;
pub mod repair;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::analysis::{decode_response, lenient};
use crate::error::GenerationError;
use crate::model::RecipeDraft;
use crate::providers::{GenerationRequest, LlmProvider};

/// Leading quantity and unit of an ingredient line: "2 1/2 cups of", "200 g", "3"
static QUANTITY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[\s\d/.,½¼¾⅓⅔-]*(?:(?:g|kg|mg|ml|l|cl|dl|cups?|tbsp|tsp|oz|lbs?|pounds?|ounces?|tablespoons?|teaspoons?|grams?|kilograms?|millilitres?|milliliters?|litres?|liters?|pinch(?:es)?|cloves?|cans?|tins?|handfuls?|slices?|sticks?)\.?\s+)?(?:of\s+)?",
    )
    .expect("Valid regex pattern")
});

/// A recipe as returned by the generation service
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GeneratedRecipe {
    #[serde(default, deserialize_with = "lenient")]
    title: String,
    #[serde(default, deserialize_with = "lenient")]
    description: String,
    #[serde(default, deserialize_with = "string_list")]
    ingredients: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    instructions: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    requested_ingredients: Vec<String>,
}

/// A list of strings, a single string, or anything else (empty)
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

impl GeneratedRecipe {
    pub(crate) fn into_parts(self) -> (RecipeDraft, Vec<String>) {
        let draft = RecipeDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            ingredients: self.ingredients,
            instructions: self.instructions,
        };
        (draft, self.requested_ingredients)
    }
}

/// Run a recipe-producing request and decode the draft it returns.
///
/// An answer with no title, ingredients or steps at all is malformed output.
pub(crate) async fn request_recipe(
    provider: &dyn LlmProvider,
    request: &GenerationRequest,
) -> Result<(RecipeDraft, Vec<String>), GenerationError> {
    let response = provider.generate(request).await?;
    let (draft, requested) = decode_response::<GeneratedRecipe>(response).into_parts();
    if draft.is_empty() {
        return Err(GenerationError::MalformedOutput(
            "the response contains no recipe".to_string(),
        ));
    }
    Ok((draft, requested))
}

/// Ingredient names without quantities, units or trailing notes:
/// "2 cups of chopped walnuts, toasted" -> "chopped walnuts"
pub fn ingredient_names(lines: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in lines {
        let rest = QUANTITY_PREFIX.replace(line.trim(), "");
        let name = rest
            .split([',', '('])
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
