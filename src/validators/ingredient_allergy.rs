use super::{structural_precondition, ValidationInput};
use crate::model::{AllergyKey, ValidationResult, Violation, ViolationKind};
use crate::normalize::contains_ci;
use crate::tables::RuleTables;

/// Substitutes for `allergy` that do not name any other allergen the user has
fn safe_substitutes(
    tables: &RuleTables,
    allergy: AllergyKey,
    active: &[AllergyKey],
) -> Vec<&'static str> {
    let mut picked: Vec<&'static str> = Vec::new();
    for substitute in tables.substitutes(allergy) {
        let names_other = active
            .iter()
            .filter(|&&other| other != allergy)
            .any(|&other| tables.match_allergen(substitute, other).is_some());
        if !names_other && !picked.contains(substitute) {
            picked.push(*substitute);
        }
    }
    picked
}

/// Cross-reference every ingredient against the user's allergies.
///
/// Allergens the user explicitly asked for are left to the warning check;
/// only unexpected ones are reported here.
pub fn validate(input: &ValidationInput) -> ValidationResult {
    if let Some(failed) = structural_precondition(&input.draft) {
        return failed;
    }

    let active: Vec<AllergyKey> = input.profile.allergies.iter().copied().collect();
    if active.is_empty() {
        return ValidationResult::valid();
    }

    let ingredients: Vec<&String> = input
        .draft
        .ingredients
        .iter()
        .filter(|i| !i.trim().is_empty())
        .collect();
    if ingredients.is_empty() {
        return ValidationResult::from_violations(vec![Violation::new(
            ViolationKind::NoIngredients,
            Some("ingredients"),
            "The recipe lists no ingredients, so allergens cannot be checked",
            "List every ingredient with its quantity.",
        )]);
    }

    let tables = &input.tables;
    let mut violations = Vec::new();

    for ingredient in ingredients {
        for &allergy in &active {
            let Some(term) = tables.match_allergen(ingredient, allergy) else {
                continue;
            };

            let requested = input.requested_ingredients.iter().any(|r| {
                (contains_ci(ingredient, r) || contains_ci(r, ingredient))
                    && tables.match_allergen(r, allergy).is_some()
            });
            if requested {
                continue;
            }

            let substitutes = safe_substitutes(tables, allergy, &active);
            let fix = if substitutes.is_empty() {
                format!("Remove '{ingredient}' or replace it with an ingredient free of {allergy}.")
            } else {
                format!(
                    "Replace '{ingredient}' with an alternative free of {allergy}, such as: {}.",
                    substitutes.join(", ")
                )
            };

            violations.push(Violation::new(
                ViolationKind::UnexpectedAllergen,
                Some("ingredients"),
                format!("'{ingredient}' contains {allergy} ({term}), which the user is allergic to"),
                fix,
            ));
        }
    }

    ValidationResult::from_violations(violations)
}
