use log::debug;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use super::RawRecipe;

#[derive(Debug, Deserialize)]
struct JsonLdRecipe {
    name: Option<TextValue>,
    description: Option<TextValue>,
    #[serde(rename = "recipeIngredient")]
    recipe_ingredient: Option<OneOrMany<TextValue>>,
    /// Older vocabulary, read when `recipeIngredient` is absent
    ingredients: Option<OneOrMany<TextValue>>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<OneOrMany<Instruction>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Text that may be a plain string, a number, or a `{"text"|"name"|"@value": ...}` object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextValue {
    String(String),
    Number(serde_json::Number),
    Object(TextObject),
}

#[derive(Debug, Deserialize)]
struct TextObject {
    text: Option<String>,
    name: Option<String>,
    #[serde(rename = "@value")]
    value: Option<String>,
}

impl TextObject {
    /// First present of `text`, `name`, `@value`
    fn first_present(self) -> Option<String> {
        [self.text, self.name, self.value]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
    }
}

impl TextValue {
    fn into_text(self) -> String {
        match self {
            TextValue::String(s) => s,
            TextValue::Number(n) => n.to_string(),
            TextValue::Object(o) => o.first_present().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Instruction {
    Text(String),
    Section(HowToSection),
    Step(TextObject),
}

#[derive(Debug, Deserialize)]
struct HowToSection {
    #[serde(rename = "itemListElement")]
    item_list_element: Vec<Instruction>,
}

impl Instruction {
    fn collect_into(self, out: &mut Vec<String>) {
        match self {
            Instruction::Text(text) => out.extend(text.lines().map(str::to_string)),
            Instruction::Section(section) => {
                for step in section.item_list_element {
                    step.collect_into(out);
                }
            }
            Instruction::Step(step) => out.extend(step.first_present()),
        }
    }
}

impl From<JsonLdRecipe> for RawRecipe {
    fn from(recipe: JsonLdRecipe) -> Self {
        let mut instructions = Vec::new();
        for step in recipe.recipe_instructions.map(OneOrMany::into_vec).unwrap_or_default() {
            step.collect_into(&mut instructions);
        }

        RawRecipe {
            title: recipe.name.map(TextValue::into_text).unwrap_or_default(),
            description: recipe
                .description
                .map(TextValue::into_text)
                .unwrap_or_default(),
            ingredients: recipe
                .recipe_ingredient
                .or(recipe.ingredients)
                .map(OneOrMany::into_vec)
                .unwrap_or_default()
                .into_iter()
                .map(TextValue::into_text)
                .collect(),
            instructions,
        }
    }
}

/// `Recipe`, `["Recipe", "NewsArticle"]` or `"https://schema.org/Recipe"`, any case
fn is_recipe_type(value: &Value) -> bool {
    let names: Vec<&str> = match value.get("@type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    names.iter().any(|name| {
        name.rsplit(['/', '#', ':'])
            .next()
            .is_some_and(|last| last.eq_ignore_ascii_case("recipe"))
    })
}

/// First Recipe object: at the top level, inside a top-level array, or inside `@graph`
fn find_recipe(json_ld: &Value) -> Option<&Value> {
    match json_ld {
        Value::Array(items) => items.iter().find_map(find_recipe),
        Value::Object(_) if is_recipe_type(json_ld) => Some(json_ld),
        Value::Object(_) => json_ld.get("@graph").and_then(find_recipe),
        _ => None,
    }
}

pub(super) fn parse(document: &Html) -> Result<RawRecipe, String> {
    let selector =
        Selector::parse("script[type='application/ld+json']").expect("Valid selector");

    let scripts: Vec<_> = document.select(&selector).collect();
    debug!("Found {} JSON-LD script tags", scripts.len());

    // Try each script element until we find a valid recipe
    for (index, script) in scripts.iter().enumerate() {
        let raw_json = script.inner_html();
        let json_ld = match serde_json::from_str::<Value>(&sanitize_json(&raw_json)) {
            Ok(value) => value,
            Err(e) => {
                debug!("Failed to parse JSON-LD block {}: {}", index, e);
                continue;
            }
        };

        let Some(recipe) = find_recipe(&json_ld) else {
            debug!("No Recipe object in JSON-LD block {}", index);
            continue;
        };

        match serde_json::from_value::<JsonLdRecipe>(recipe.clone()) {
            Ok(recipe) => return Ok(recipe.into()),
            Err(e) => debug!("Recipe in JSON-LD block {} has an unexpected shape: {}", index, e),
        }
    }

    Err("No valid recipe found in any JSON-LD script".to_string())
}

/// Repair the usual hand-written JSON-LD damage: HTML comment or CDATA
/// wrappers and trailing commas before `]` or `}`.
fn sanitize_json(json_str: &str) -> String {
    let unwrapped = json_str
        .trim()
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim()
        .trim_start_matches("//<![CDATA[")
        .trim_start_matches("<![CDATA[")
        .trim_end_matches("//]]>")
        .trim_end_matches("]]>");

    let chars: Vec<char> = unwrapped.chars().collect();
    let mut cleaned = String::with_capacity(unwrapped.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                // raw newlines are invalid inside JSON strings
                '\n' | '\r' => {
                    cleaned.push(' ');
                    continue;
                }
                _ => {}
            }
            cleaned.push(c);
            continue;
        }

        match c {
            '"' => in_string = true,
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(']' | '}') | None) {
                    continue;
                }
            }
            _ => {}
        }
        cleaned.push(c);
    }

    cleaned
}
