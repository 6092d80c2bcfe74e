use super::{structural_precondition, ValidationInput};
use crate::model::{AllergyKey, ValidationResult, Violation, ViolationKind};
use crate::normalize::contains_ci;

/// Glyph every allergen warning must carry. The variation selector is optional.
pub const WARNING_MARKER: &str = "⚠";

/// A warning may sit in the step itself or in either of the two steps before it
const WINDOW: usize = 3;

/// A requested ingredient that is also one of the user's allergens
struct RequestedAllergen<'a> {
    ingredient: &'a str,
    allergy: AllergyKey,
}

fn names_allergen(text: &str, allergy: AllergyKey) -> bool {
    let label = allergy.label();
    contains_ci(text, label)
        || contains_ci(text, allergy.key())
        || label
            .strip_suffix('s')
            .is_some_and(|singular| contains_ci(text, singular))
}

/// Every step that mentions a requested allergen needs a marked, allergen-naming
/// warning within the trailing window ending at that step.
pub fn validate(input: &ValidationInput) -> ValidationResult {
    if let Some(failed) = structural_precondition(&input.draft) {
        return failed;
    }

    let requested: Vec<RequestedAllergen> = input
        .requested_ingredients
        .iter()
        .filter(|r| !r.trim().is_empty())
        .flat_map(|ingredient| {
            input
                .profile
                .allergies
                .iter()
                .filter(move |&&allergy| {
                    input.tables.match_allergen(ingredient, allergy).is_some()
                        || contains_ci(allergy.label(), ingredient)
                })
                .map(move |&allergy| RequestedAllergen {
                    ingredient: ingredient.as_str(),
                    allergy,
                })
        })
        .collect();

    if requested.is_empty() {
        return ValidationResult::valid();
    }

    let steps = &input.draft.instructions;
    let mut violations = Vec::new();
    let mut reported = Vec::new();

    for (i, step) in steps.iter().enumerate() {
        for item in &requested {
            if !contains_ci(step, item.ingredient) || reported.contains(&(i, item.allergy)) {
                continue;
            }

            let window = &steps[(i + 1).saturating_sub(WINDOW)..=i];
            let marked: Vec<&String> = window
                .iter()
                .filter(|s| s.contains(WARNING_MARKER))
                .collect();

            let step_number = i + 1;
            let allergen = item.allergy.label();

            if marked.is_empty() {
                violations.push(Violation::new(
                    ViolationKind::MissingEmoji,
                    Some("instructions"),
                    format!(
                        "Step {step_number} uses {} ({allergen}) without a ⚠️ warning",
                        item.ingredient
                    ),
                    format!(
                        "Add \"⚠️ WARNING: contains {} ({allergen})\" in step {step_number} or in one of the two steps before it.",
                        item.ingredient
                    ),
                ));
            } else if !marked.iter().any(|s| names_allergen(s, item.allergy)) {
                violations.push(Violation::new(
                    ViolationKind::GenericWarning,
                    Some("instructions"),
                    format!(
                        "The warning before step {step_number} does not name the allergen {allergen}"
                    ),
                    format!(
                        "Rewrite the ⚠️ warning near step {step_number} so it names {allergen} explicitly, e.g. \"⚠️ WARNING: contains {} ({allergen})\".",
                        item.ingredient
                    ),
                ));
            } else {
                continue;
            }
            reported.push((i, item.allergy));
        }
    }

    ValidationResult::from_violations(violations)
}
