use once_cell::sync::Lazy;
use regex::Regex;

use super::{structural_precondition, ValidationInput};
use crate::model::{ValidationResult, Violation, ViolationKind};
use crate::normalize::{contains_ci, contains_word};

/// "no mushrooms", "without onion", "I don't like coriander", "avoid any pork"
static EXCLUSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:no|without|avoid(?:s|ing)?|(?:do not|don'?t) (?:like|eat|want)|dislikes?|hates?)\s+((?:[a-z'-]+\s*?)+?)\s*(?:[,.;!/]|\band\b|\bor\b|\bplease\b|$)",
    )
    .expect("Valid regex pattern")
});

/// Leading filler words that are not part of the excluded ingredient
const FILLER: &[&str] = &["any", "the", "a", "too much", "much", "more"];

/// One thing the preferences rule out, why, and the qualifiers that lift it
struct Forbidden<'a> {
    term: String,
    reason: String,
    exemptions: &'a [&'static str],
}

impl Forbidden<'_> {
    fn matches(&self, ingredient: &str) -> bool {
        if self.exemptions.iter().any(|e| contains_ci(ingredient, e)) {
            return false;
        }
        contains_word(ingredient, &self.term)
            || singular(&self.term).is_some_and(|s| contains_word(ingredient, &s))
    }
}

/// "mushrooms" -> "mushroom", "cherries" -> "cherry", "tomatoes" -> "tomato"
fn singular(term: &str) -> Option<String> {
    if let Some(stem) = term.strip_suffix("ies") {
        Some(format!("{stem}y"))
    } else if let Some(stem) = term.strip_suffix("oes") {
        Some(format!("{stem}o"))
    } else if term.ends_with("ss") {
        None
    } else {
        term.strip_suffix('s').map(str::to_string)
    }
}

fn strip_filler(phrase: &str) -> &str {
    let mut phrase = phrase.trim();
    loop {
        let before = phrase;
        for filler in FILLER {
            if let Some(rest) = phrase.strip_prefix(filler) {
                if rest.starts_with(' ') {
                    phrase = rest.trim_start();
                }
            }
        }
        if phrase == before {
            return phrase;
        }
    }
}

fn forbidden_terms<'a>(input: &'a ValidationInput) -> Vec<Forbidden<'a>> {
    let preferences = input.profile.preferences.as_str();
    let mut forbidden = Vec::new();

    for diet in input.tables.diets() {
        if diet.triggers.iter().any(|t| contains_word(preferences, t)) {
            forbidden.extend(diet.forbidden.iter().map(|term| Forbidden {
                term: term.to_string(),
                reason: format!("the user follows a {} diet", diet.name),
                exemptions: &diet.exemptions,
            }));
        }
    }

    for caps in EXCLUSION_REGEX.captures_iter(preferences) {
        let term = strip_filler(&caps[1]).to_lowercase();
        if term.is_empty() {
            continue;
        }
        forbidden.push(Forbidden {
            reason: format!("the user asked for no {term}"),
            term,
            exemptions: &[],
        });
    }

    forbidden
}

/// Ingredients must not contradict the diet or exclusions in the free-text preferences
pub fn validate(input: &ValidationInput) -> ValidationResult {
    if let Some(failed) = structural_precondition(&input.draft) {
        return failed;
    }
    if input.profile.preferences.trim().is_empty() {
        return ValidationResult::valid();
    }

    let forbidden = forbidden_terms(input);
    let mut violations = Vec::new();

    for (i, ingredient) in input.draft.ingredients.iter().enumerate() {
        if let Some(hit) = forbidden.iter().find(|f| f.matches(ingredient)) {
            violations.push(Violation::new(
                ViolationKind::PreferenceConflict,
                Some("ingredients"),
                format!(
                    "Ingredient {} ('{ingredient}') contains {}, but {}",
                    i + 1,
                    hit.term,
                    hit.reason
                ),
                format!(
                    "Replace '{ingredient}' with an ingredient that fits the user's preferences ({}).",
                    input.profile.preferences.trim()
                ),
            ));
        }
    }

    ValidationResult::from_violations(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_support::input;

    fn with_preferences(ingredients: &[&str], preferences: &str) -> ValidationInput {
        let mut base = input(ingredients, &["Cook everything"], &[], &[]);
        base.profile.preferences = preferences.to_string();
        base
    }

    #[test]
    fn test_vegetarian_rejects_meat() {
        let input = with_preferences(&["200 g chicken thighs", "1 onion"], "I'm vegetarian");
        let result = validate(&input);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].message.contains("vegetarian"));
    }

    #[test]
    fn test_explicit_exclusion() {
        let input = with_preferences(
            &["250 g mushrooms", "1 onion", "fresh coriander"],
            "No mushrooms, and I don't like coriander please",
        );
        let result = validate(&input);
        assert_eq!(result.violations.len(), 2);
    }

    #[test]
    fn test_exempt_variants_are_accepted() {
        let input = with_preferences(&["150 g vegan bacon", "200 g tofu"], "vegan");
        assert!(validate(&input).valid);
    }

    #[test]
    fn test_exemption_only_lifts_its_own_diet() {
        let input = with_preferences(
            &["300 g gluten-free chicken nuggets", "100 g vegan mushroom pate"],
            "vegetarian, no mushrooms",
        );
        let result = validate(&input);
        assert_eq!(result.violations.len(), 2);
        assert!(result.violations[0].message.contains("vegetarian"));
        assert!(result.violations[1].message.contains("no mushrooms"));
    }

    #[test]
    fn test_dairy_free_variant_still_breaks_vegan() {
        let input = with_preferences(&["100 g dairy-free chicken stock cubes"], "vegan");
        assert_eq!(validate(&input).violations.len(), 1);

        let input = with_preferences(&["200 ml dairy-free milk"], "dairy-free please");
        assert!(validate(&input).valid);
    }

    #[test]
    fn test_word_boundaries_avoid_false_hits() {
        let input = with_preferences(&["4 graham crackers", "1 shallot"], "halal");
        assert!(validate(&input).valid);
    }

    #[test]
    fn test_blank_preferences_trivially_valid() {
        let input = with_preferences(&["1 kg pork belly"], "  ");
        assert!(validate(&input).valid);
    }

    #[test]
    fn test_strip_filler() {
        assert_eq!(strip_filler("any pork"), "pork");
        assert_eq!(strip_filler("too much salt"), "salt");
        assert_eq!(strip_filler("anchovies"), "anchovies");
    }

    #[test]
    fn test_singular() {
        assert_eq!(singular("mushrooms").as_deref(), Some("mushroom"));
        assert_eq!(singular("cherries").as_deref(), Some("cherry"));
        assert_eq!(singular("tomatoes").as_deref(), Some("tomato"));
        assert_eq!(singular("swiss"), None);
        assert_eq!(singular("coriander"), None);
    }
}
