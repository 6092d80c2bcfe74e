use super::{missing_instructions, missing_title, ValidationInput};
use crate::model::{ValidationResult, Violation, ViolationKind};
use crate::normalize::contains_ci;

/// Required fields, plus consistency between what was asked for, what is
/// listed and what the steps use.
pub fn validate(input: &ValidationInput) -> ValidationResult {
    let draft = &input.draft;
    let mut violations = Vec::new();

    if draft.title.trim().is_empty() {
        violations.push(missing_title());
    }
    if draft.instructions.iter().all(|s| s.trim().is_empty()) {
        violations.push(missing_instructions());
    }
    if draft.ingredients.iter().all(|s| s.trim().is_empty()) {
        violations.push(Violation::new(
            ViolationKind::MissingField,
            Some("ingredients"),
            "The recipe has no ingredients",
            "List every ingredient with its quantity in metric units.",
        ));
    }
    if !violations.is_empty() {
        return ValidationResult::from_violations(violations);
    }

    for requested in input.requested_ingredients.iter().map(|r| r.trim()) {
        if requested.is_empty() {
            continue;
        }

        if !draft.ingredients.iter().any(|i| contains_ci(i, requested)) {
            violations.push(Violation::new(
                ViolationKind::MissingRequestedIngredient,
                Some("ingredients"),
                format!("The user asked for {requested}, but it is not in the ingredient list"),
                format!("Add {requested} to the ingredients with a metric quantity."),
            ));
            continue;
        }

        let allergen = input
            .profile
            .allergies
            .iter()
            .find(|&&a| input.tables.match_allergen(requested, a).is_some());
        if let Some(allergen) = allergen {
            if !draft.instructions.iter().any(|s| contains_ci(s, requested)) {
                violations.push(Violation::new(
                    ViolationKind::AllergenNotInInstructions,
                    Some("instructions"),
                    format!(
                        "{requested} ({allergen}) is listed but no step says when to add it"
                    ),
                    format!(
                        "Mention {requested} in the step where it is used, preceded by \"⚠️ WARNING: contains {requested} ({allergen})\"."
                    ),
                ));
            }
        }
    }

    ValidationResult::from_violations(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_support::input;

    #[test]
    fn test_complete_recipe_passes() {
        let input = input(&["2 eggs"], &["Whisk the eggs"], &[], &["eggs"]);
        assert!(validate(&input).valid);
    }

    #[test]
    fn test_all_missing_fields_reported() {
        let mut input = input(&[], &[], &[], &[]);
        input.draft.title = String::new();

        let fields: Vec<_> = validate(&input)
            .violations
            .into_iter()
            .map(|v| v.field.unwrap())
            .collect();
        assert_eq!(fields, vec!["title", "instructions", "ingredients"]);
    }

    #[test]
    fn test_requested_ingredient_missing_from_list() {
        let input = input(&["200 g rice"], &["Cook the rice"], &[], &["saffron"]);
        let result = validate(&input);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].kind,
            ViolationKind::MissingRequestedIngredient
        );
    }

    #[test]
    fn test_requested_allergen_never_used_in_steps() {
        let input = input(
            &["50 g peanuts", "200 g noodles"],
            &["Boil the noodles", "Serve"],
            &["peanuts"],
            &["peanuts"],
        );
        let result = validate(&input);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].kind,
            ViolationKind::AllergenNotInInstructions
        );
    }
}
