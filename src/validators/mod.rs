//! Independent rule checkers over a candidate recipe.
//!
//! Each checker is a plain function of a [`ValidationInput`]; none mutates its
//! input or calls another checker. [`run_all`] fans them out and joins on all
//! of them.

use futures::future::join_all;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::model::{RecipeDraft, UserProfile, ValidationResult, Violation, ViolationKind};
use crate::tables::RuleTables;

pub mod allergen_warning;
pub mod appliance;
pub mod completeness;
pub mod ingredient_allergy;
pub mod metric_units;
pub mod preferences;

/// Everything a checker may look at. Shared read-only across the fan-out.
#[derive(Debug, Clone)]
pub struct ValidationInput {
    pub draft: RecipeDraft,
    pub profile: UserProfile,
    /// Ingredients the user explicitly asked for
    pub requested_ingredients: Vec<String>,
    pub tables: Arc<RuleTables>,
}

type CheckFn = fn(&ValidationInput) -> ValidationResult;

/// The six checkers, in the order their findings are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorKind {
    AllergenWarning,
    IngredientAllergy,
    ApplianceCompatibility,
    MetricUnits,
    Completeness,
    PreferenceCompliance,
}

impl ValidatorKind {
    pub const ALL: [ValidatorKind; 6] = [
        ValidatorKind::AllergenWarning,
        ValidatorKind::IngredientAllergy,
        ValidatorKind::ApplianceCompatibility,
        ValidatorKind::MetricUnits,
        ValidatorKind::Completeness,
        ValidatorKind::PreferenceCompliance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ValidatorKind::AllergenWarning => "allergen_warning",
            ValidatorKind::IngredientAllergy => "ingredient_allergy",
            ValidatorKind::ApplianceCompatibility => "appliance_compatibility",
            ValidatorKind::MetricUnits => "metric_units",
            ValidatorKind::Completeness => "completeness",
            ValidatorKind::PreferenceCompliance => "preference_compliance",
        }
    }

    fn check_fn(&self) -> CheckFn {
        match self {
            ValidatorKind::AllergenWarning => allergen_warning::validate,
            ValidatorKind::IngredientAllergy => ingredient_allergy::validate,
            ValidatorKind::ApplianceCompatibility => appliance::validate,
            ValidatorKind::MetricUnits => metric_units::validate,
            ValidatorKind::Completeness => completeness::validate,
            ValidatorKind::PreferenceCompliance => preferences::validate,
        }
    }
}

/// Run `checkers` concurrently and wait for every one of them.
///
/// A checker that panics is reported as a `validator_error` violation; the
/// others still report. Results come back in the order of `checkers`.
pub async fn run_checkers(
    checkers: &[ValidatorKind],
    input: Arc<ValidationInput>,
) -> Vec<(ValidatorKind, ValidationResult)> {
    let checks: Vec<_> = checkers.iter().map(|&kind| (kind, kind.check_fn())).collect();
    run_check_fns(&checks, input).await
}

async fn run_check_fns(
    checks: &[(ValidatorKind, CheckFn)],
    input: Arc<ValidationInput>,
) -> Vec<(ValidatorKind, ValidationResult)> {
    let handles = checks.iter().map(|&(kind, check)| {
        let input = Arc::clone(&input);
        async move {
            let outcome = tokio::task::spawn_blocking(move || check(&input)).await;
            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    warn!("Validator {} failed: {}", kind.name(), e);
                    ValidationResult::from_violations(vec![validator_error(kind, &e.to_string())])
                }
            };
            debug!(
                "Validator {} reported {} violation(s)",
                kind.name(),
                result.violations.len()
            );
            (kind, result)
        }
    });

    join_all(handles).await
}

/// Run all six checkers concurrently
pub async fn run_all(input: Arc<ValidationInput>) -> Vec<(ValidatorKind, ValidationResult)> {
    run_checkers(&ValidatorKind::ALL, input).await
}

/// Merge per-checker results into one ordered list. Duplicates are dropped,
/// first occurrence wins.
pub fn aggregate(results: &[(ValidatorKind, ValidationResult)]) -> Vec<Violation> {
    let mut seen = HashSet::new();
    results
        .iter()
        .flat_map(|(_, result)| result.violations.iter())
        .filter(|v| seen.insert(*v))
        .cloned()
        .collect()
}

fn validator_error(kind: ValidatorKind, detail: &str) -> Violation {
    Violation::new(
        ViolationKind::ValidatorError,
        None,
        format!("The {} check could not run: {}", kind.name(), detail),
        format!(
            "Re-check the recipe against the {} rule before serving it.",
            kind.name()
        ),
    )
}

pub(crate) fn missing_title() -> Violation {
    Violation::new(
        ViolationKind::MissingField,
        Some("title"),
        "The recipe has no title",
        "Give the recipe a short descriptive title.",
    )
}

pub(crate) fn missing_instructions() -> Violation {
    Violation::new(
        ViolationKind::MissingField,
        Some("instructions"),
        "The recipe has no instructions",
        "Add numbered step-by-step instructions.",
    )
}

/// Every checker refuses drafts without a title or without instructions
pub(crate) fn structural_precondition(draft: &RecipeDraft) -> Option<ValidationResult> {
    if draft.title.trim().is_empty() {
        Some(ValidationResult::from_violations(vec![missing_title()]))
    } else if draft.instructions.iter().all(|s| s.trim().is_empty()) {
        Some(ValidationResult::from_violations(vec![missing_instructions()]))
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::model::UserProfile;

    pub fn input(
        ingredients: &[&str],
        instructions: &[&str],
        allergies: &[&str],
        requested: &[&str],
    ) -> ValidationInput {
        ValidationInput {
            draft: RecipeDraft {
                title: "Test Recipe".to_string(),
                description: String::new(),
                ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
                instructions: instructions.iter().map(|s| s.to_string()).collect(),
            },
            profile: UserProfile::from_keys(allergies.iter(), Vec::<String>::new(), "").unwrap(),
            requested_ingredients: requested.iter().map(|s| s.to_string()).collect(),
            tables: Arc::new(RuleTables::standard()),
        }
    }
}
