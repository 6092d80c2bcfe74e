use log::debug;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use super::RawRecipe;

/// Class names used by common recipe plugins, per field
struct ClassMatchers {
    exact: &'static [&'static str],
    fuzzy: &'static [&'static str],
}

const TITLE: ClassMatchers = ClassMatchers {
    exact: &[
        "wprm-recipe-name",
        "tasty-recipes-title",
        "mv-create-title",
        "recipe-name",
        "recipe-title",
        "recipe-card-title",
        "wpzoom-recipe-card-title",
        "recipe-card__title",
    ],
    fuzzy: &[],
};

const DESCRIPTION: ClassMatchers = ClassMatchers {
    exact: &[
        "wprm-recipe-summary",
        "recipe-summary",
        "recipe-description",
        "mv-create-description",
        "tasty-recipes-description",
        "recipe-card-summary",
        "recipe-intro",
    ],
    fuzzy: &["summary", "description", "intro"],
};

const INGREDIENTS: ClassMatchers = ClassMatchers {
    exact: &[
        "wprm-recipe-ingredients-container",
        "tasty-recipes-ingredients",
        "mv-create-ingredients",
        "recipe-ingredients",
        "recipe-ingredient-list",
        "recipe-card-ingredients",
        "wpzoom-recipe-ingredients",
        "structured-ingredients",
        "ingredients",
    ],
    fuzzy: &["ingredient"],
};

const INSTRUCTIONS: ClassMatchers = ClassMatchers {
    exact: &[
        "wprm-recipe-instructions-container",
        "tasty-recipes-instructions",
        "mv-create-instructions",
        "recipe-instructions",
        "recipe-instruction-list",
        "recipe-card-instructions",
        "wpzoom-recipe-instructions",
        "structured-instructions",
        "recipe-directions",
        "directions",
        "instructions",
    ],
    fuzzy: &["instruction", "direction", "method", "step"],
};

/// Fuzzy matches above this size are probably the whole page
const MAX_FUZZY_TEXT: usize = 5000;

fn element_text(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn selectors(matchers: &ClassMatchers) -> Vec<(Selector, bool)> {
    let exact = matchers
        .exact
        .iter()
        .map(|class| (format!(".{class}, #{class}"), false));
    let fuzzy = matchers
        .fuzzy
        .iter()
        .map(|pattern| (format!("[class*='{pattern}'], [id*='{pattern}']"), true));

    exact
        .chain(fuzzy)
        .filter_map(|(css, is_fuzzy)| Selector::parse(&css).ok().map(|s| (s, is_fuzzy)))
        .collect()
}

fn first_heading(document: &Html, tag: &str) -> Option<String> {
    let selector = Selector::parse(tag).ok()?;
    document
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn find_text(document: &Html, matchers: &ClassMatchers) -> Option<String> {
    for (selector, is_fuzzy) in selectors(matchers) {
        let found = document
            .select(&selector)
            .map(element_text)
            .find(|text| !text.is_empty() && (!is_fuzzy || text.len() < MAX_FUZZY_TEXT));
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Line items under the first matching container kind. Nested matches are
/// skipped so an item is never read twice.
fn find_items(document: &Html, matchers: &ClassMatchers) -> Vec<String> {
    let li = Selector::parse("li").expect("Valid selector");

    for (selector, is_fuzzy) in selectors(matchers) {
        let containers: Vec<ElementRef> = document.select(&selector).collect();
        let ids: HashSet<_> = containers.iter().map(|c| c.id()).collect();

        let mut items = Vec::new();
        for container in &containers {
            let nested = container.ancestors().any(|a| ids.contains(&a.id()));
            if nested {
                continue;
            }

            let list_items: Vec<String> = container.select(&li).map(element_text).collect();
            if !list_items.is_empty() {
                items.extend(list_items);
            } else if !is_fuzzy {
                // a container without a list holds one item per line
                items.extend(
                    container
                        .text()
                        .flat_map(str::lines)
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string),
                );
            }
        }

        items.retain(|item| !item.is_empty());
        if !items.is_empty() {
            return items;
        }
    }

    Vec::new()
}

pub(super) fn parse(document: &Html) -> Result<RawRecipe, String> {
    debug!("Attempting to extract recipe using HTML class matchers");

    let title = first_heading(document, "h1")
        .or_else(|| find_text(document, &TITLE))
        .or_else(|| first_heading(document, "h2"))
        .ok_or_else(|| "Could not extract recipe title from HTML".to_string())?;

    let ingredients = find_items(document, &INGREDIENTS);
    let instructions = find_items(document, &INSTRUCTIONS);

    if ingredients.is_empty() && instructions.is_empty() {
        return Err("Could not extract recipe content from HTML".to_string());
    }

    debug!("Recipe name: {}", title);
    debug!("Ingredients count: {}", ingredients.len());
    debug!("Instructions count: {}", instructions.len());

    Ok(RawRecipe {
        title,
        description: find_text(document, &DESCRIPTION).unwrap_or_default(),
        ingredients,
        instructions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_classes() {
        let html = r#"
            <html><body>
                <h1>Weeknight Chili</h1>
                <div class="wprm-recipe-summary">Hearty and quick.</div>
                <div class="wprm-recipe-ingredients-container">
                    <ul class="wprm-recipe-ingredients">
                        <li class="wprm-recipe-ingredient">500 g beef mince</li>
                        <li class="wprm-recipe-ingredient">1 tin beans</li>
                    </ul>
                </div>
                <div class="wprm-recipe-instructions-container">
                    <ul><li>Brown the beef.</li><li>Add the beans and simmer.</li></ul>
                </div>
            </body></html>
        "#;

        let recipe = parse(&Html::parse_document(html)).unwrap();
        assert_eq!(recipe.title, "Weeknight Chili");
        assert_eq!(recipe.description, "Hearty and quick.");
        assert_eq!(recipe.ingredients, vec!["500 g beef mince", "1 tin beans"]);
        assert_eq!(recipe.instructions.len(), 2);
    }

    #[test]
    fn test_fuzzy_ids_and_nested_containers() {
        let html = r#"
            <h2>Lemon Rice</h2>
            <section id="recipe-ingredients-block">
                <div class="ingredient-group">
                    <ul><li>200 g rice</li><li>1 lemon</li></ul>
                </div>
            </section>
            <section id="method">
                <ol><li>Cook the rice.</li><li>Stir in lemon zest.</li></ol>
            </section>
        "#;

        let recipe = parse(&Html::parse_document(html)).unwrap();
        assert_eq!(recipe.title, "Lemon Rice");
        assert_eq!(recipe.ingredients, vec!["200 g rice", "1 lemon"]);
        assert_eq!(recipe.instructions, vec!["Cook the rice.", "Stir in lemon zest."]);
    }

    #[test]
    fn test_container_without_list_splits_lines() {
        let html = "<h1>Tea</h1><div class=\"ingredients\">1 tea bag\n250 ml water</div>";
        let recipe = parse(&Html::parse_document(html)).unwrap();
        assert_eq!(recipe.ingredients, vec!["1 tea bag", "250 ml water"]);
    }

    #[test]
    fn test_no_title() {
        let html = "<div class=\"ingredients\"><ul><li>salt</li></ul></div>";
        assert!(parse(&Html::parse_document(html)).is_err());
    }
}
