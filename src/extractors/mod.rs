//! Recipe extraction from fetched web pages.
//!
//! Three strategies are tried in a fixed order and the first one that yields a
//! usable recipe (a title and at least one ingredient) wins:
//! embedded JSON-LD, microdata attributes, then class/heading heuristics.

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::Serialize;

use crate::error::PipelineError;
use crate::fetchers::Fetcher;
use crate::model::RecipeDraft;
use crate::normalize::{clean_line, normalize_url};

mod html_class;
mod json_ld;
mod microdata;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Valid regex pattern"));

/// Fields pulled out of a page by one strategy, before normalization
#[derive(Debug, Default)]
pub(crate) struct RawRecipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

type ParseFn = fn(&Html) -> Result<RawRecipe, String>;

/// Which strategy produced an [`ExtractionResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    LinkedData,
    Microdata,
    Heuristic,
}

impl ExtractionStrategy {
    /// Priority order
    pub const ALL: [ExtractionStrategy; 3] = [
        ExtractionStrategy::LinkedData,
        ExtractionStrategy::Microdata,
        ExtractionStrategy::Heuristic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExtractionStrategy::LinkedData => "linked_data",
            ExtractionStrategy::Microdata => "microdata",
            ExtractionStrategy::Heuristic => "heuristic",
        }
    }

    fn parse_fn(&self) -> ParseFn {
        match self {
            ExtractionStrategy::LinkedData => json_ld::parse,
            ExtractionStrategy::Microdata => microdata::parse,
            ExtractionStrategy::Heuristic => html_class::parse,
        }
    }

    /// Run this strategy alone. `None` when it finds nothing usable.
    pub fn run(&self, document: &Html) -> Option<ExtractionResult> {
        match (self.parse_fn())(document) {
            Ok(raw) => {
                let result = ExtractionResult::from_raw(raw, *self);
                if result.is_usable() {
                    Some(result)
                } else {
                    debug!(
                        "{} strategy found a recipe without a title or ingredients",
                        self.name()
                    );
                    None
                }
            }
            Err(reason) => {
                debug!("{} strategy: {}", self.name(), reason);
                None
            }
        }
    }
}

/// A normalized recipe skeleton plus the strategy that found it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub strategy: ExtractionStrategy,
}

impl ExtractionResult {
    fn from_raw(raw: RawRecipe, strategy: ExtractionStrategy) -> Self {
        ExtractionResult {
            title: clean_text(&raw.title),
            description: clean_text(&raw.description),
            ingredients: clean_lines(raw.ingredients),
            instructions: clean_lines(raw.instructions),
            strategy,
        }
    }

    fn is_usable(&self) -> bool {
        !self.title.is_empty() && !self.ingredients.is_empty()
    }

    pub fn into_draft(self) -> RecipeDraft {
        RecipeDraft {
            title: self.title,
            description: self.description,
            ingredients: self.ingredients,
            instructions: self.instructions,
        }
    }

    /// Plain-text rendering handed to the structuring prompt
    pub fn to_source_text(&self) -> String {
        let mut out = format!("{}\n", self.title);
        if !self.description.is_empty() {
            out.push_str(&format!("{}\n", self.description));
        }
        out.push_str("\nIngredients:\n");
        for ingredient in &self.ingredients {
            out.push_str(&format!("- {ingredient}\n"));
        }
        out.push_str("\nInstructions:\n");
        for (i, step) in self.instructions.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }
        out
    }
}

fn clean_text(raw: &str) -> String {
    clean_line(&TAG_REGEX.replace_all(raw, " "))
}

fn clean_lines(raw: Vec<String>) -> Vec<String> {
    raw.iter()
        .map(|line| clean_text(line))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Extract a recipe from raw HTML, trying each strategy in priority order
pub fn extract(raw_html: &str) -> Result<ExtractionResult, PipelineError> {
    if raw_html.trim().is_empty() {
        return Err(PipelineError::Extraction("the page is empty".to_string()));
    }

    let document = Html::parse_document(raw_html);
    for strategy in ExtractionStrategy::ALL {
        debug!("Trying {} extraction", strategy.name());
        if let Some(result) = strategy.run(&document) {
            info!(
                "Extracted '{}' with the {} strategy ({} ingredients, {} steps)",
                result.title,
                strategy.name(),
                result.ingredients.len(),
                result.instructions.len()
            );
            return Ok(result);
        }
    }

    Err(PipelineError::Extraction(
        "no extraction strategy found a recipe on the page".to_string(),
    ))
}

/// Normalize `url`, fetch it and extract the recipe.
///
/// A blank or malformed URL is an `InvalidInput` error; any fetch failure is
/// reported as `Extraction` so the caller can ask for pasted text instead.
pub async fn extract_from_url(
    fetcher: &dyn Fetcher,
    url: &str,
) -> Result<ExtractionResult, PipelineError> {
    let url = normalize_url(url)?;
    let html = fetcher.fetch(&url).await.map_err(|e| match e {
        PipelineError::InvalidInput(_) | PipelineError::Extraction(_) => e,
        other => PipelineError::Extraction(format!("could not fetch {url}: {other}")),
    })?;
    extract(&html)
}
