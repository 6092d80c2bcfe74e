use log::debug;
use scraper::{ElementRef, Html, Selector};

use super::RawRecipe;

fn is_recipe_itemtype(itemtype: &str) -> bool {
    itemtype.split_whitespace().any(|t| {
        let t = t.to_ascii_lowercase();
        t.ends_with("schema.org/recipe") || t.ends_with("data-vocabulary.org/recipe")
    })
}

fn find_recipe_container(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("[itemscope][itemtype]").expect("Valid selector");
    document
        .select(&selector)
        .find(|el| el.value().attr("itemtype").is_some_and(is_recipe_itemtype))
}

/// Whether `el` is a property of `scope` itself rather than of an item nested in it
fn belongs_to(el: ElementRef, scope: ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().attr("itemscope").is_some())
        .is_some_and(|nearest| nearest.id() == scope.id())
}

fn has_prop(el: &ElementRef, prop: &str) -> bool {
    el.value()
        .attr("itemprop")
        .is_some_and(|props| props.split_whitespace().any(|p| p == prop))
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

/// `<meta content>` carries its value in the attribute
fn prop_value(el: ElementRef) -> String {
    match el.value().attr("content") {
        Some(content) if el.value().name() == "meta" => content.trim().to_string(),
        _ => element_text(el),
    }
}

/// Elements carrying `prop` that belong to the recipe scope, in document order
fn props<'a>(scope: ElementRef<'a>, prop: &str) -> Vec<ElementRef<'a>> {
    let selector = Selector::parse("[itemprop]").expect("Valid selector");
    scope
        .select(&selector)
        .filter(|el| has_prop(el, prop) && belongs_to(*el, scope))
        .collect()
}

fn first_prop(scope: ElementRef, prop: &str) -> Option<String> {
    props(scope, prop)
        .into_iter()
        .map(prop_value)
        .find(|value| !value.is_empty())
}

/// Values of every element carrying one of `names`. An instruction block holding a
/// list yields one entry per list item.
fn prop_list(scope: ElementRef, names: &[&str]) -> Vec<String> {
    let li = Selector::parse("li").expect("Valid selector");

    for prop in names {
        let mut items = Vec::new();
        for el in props(scope, prop) {
            let list_items: Vec<String> = el.select(&li).map(element_text).collect();
            if list_items.is_empty() {
                items.push(prop_value(el));
            } else {
                items.extend(list_items);
            }
        }
        if !items.is_empty() {
            return items;
        }
    }

    Vec::new()
}

pub(super) fn parse(document: &Html) -> Result<RawRecipe, String> {
    // Searching for itemprop outside a Recipe scope picks up site titles and bios
    let container = find_recipe_container(document)
        .ok_or_else(|| "No MicroData Recipe container found".to_string())?;
    debug!("Found MicroData Recipe container");

    let title = first_prop(container, "name")
        .ok_or_else(|| "Could not extract recipe name".to_string())?;

    Ok(RawRecipe {
        title,
        description: first_prop(container, "description").unwrap_or_default(),
        ingredients: prop_list(container, &["recipeIngredient", "ingredients"]),
        instructions: prop_list(container, &["recipeInstructions", "instructions"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANANA_BREAD: &str = r#"
        <html><body>
        <h1>Site header</h1>
        <div class="easyrecipe" itemscope itemtype="http://schema.org/Recipe">
            <div itemprop="author" itemscope itemtype="http://schema.org/Person">
                <span itemprop="name">Cooking Divine</span>
            </div>
            <div itemprop="name">Mom's Famous Banana Bread</div>
            <meta itemprop="description" content="Mom's famous recipe">
            <ul>
                <li itemprop="ingredients">5 tbsp butter</li>
                <li itemprop="ingredients">200 g sugar</li>
            </ul>
            <div itemprop="recipeInstructions">
                <ol><li>Cream the butter and sugar.</li><li>Bake for 1 hour.</li></ol>
            </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_microdata_extraction() {
        let recipe = parse(&Html::parse_document(BANANA_BREAD)).unwrap();

        assert_eq!(recipe.title, "Mom's Famous Banana Bread");
        assert_eq!(recipe.description, "Mom's famous recipe");
        assert_eq!(recipe.ingredients, vec!["5 tbsp butter", "200 g sugar"]);
        assert_eq!(
            recipe.instructions,
            vec!["Cream the butter and sugar.", "Bake for 1 hour."]
        );
    }

    #[test]
    fn test_nested_scope_properties_ignored() {
        let html = r#"
            <div itemscope itemtype="https://schema.org/Recipe">
                <div itemprop="author" itemscope itemtype="https://schema.org/Person">
                    <span itemprop="name">Someone Else</span>
                </div>
                <span itemprop="recipeIngredient">1 egg</span>
            </div>
        "#;
        assert!(parse(&Html::parse_document(html)).is_err());
    }

    #[test]
    fn test_requires_recipe_scope() {
        let html = r#"<div itemprop="name">Loose name</div><li itemprop="recipeIngredient">salt</li>"#;
        assert!(parse(&Html::parse_document(html)).is_err());
    }

    #[test]
    fn test_itemtype_matching() {
        assert!(is_recipe_itemtype("http://schema.org/Recipe"));
        assert!(is_recipe_itemtype("https://data-vocabulary.org/Recipe"));
        assert!(!is_recipe_itemtype("https://schema.org/RecipeCollection"));
    }
}
