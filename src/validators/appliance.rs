use super::{structural_precondition, ValidationInput};
use crate::model::{ApplianceKey, ValidationResult, Violation, ViolationKind};

pub fn validate(input: &ValidationInput) -> ValidationResult {
    if let Some(failed) = structural_precondition(&input.draft) {
        return failed;
    }

    let owned = &input.profile.appliances;
    // No appliances on file means the user never told us
    if owned.is_empty() {
        return ValidationResult::valid();
    }

    let available = owned
        .iter()
        .map(ApplianceKey::label)
        .collect::<Vec<_>>()
        .join(", ");

    let mut violations = Vec::new();
    for (i, step) in input.draft.instructions.iter().enumerate() {
        for appliance in ApplianceKey::ALL {
            if owned.contains(&appliance) {
                continue;
            }
            if let Some(keyword) = input.tables.match_appliance(step, appliance) {
                violations.push(Violation::new(
                    ViolationKind::ApplianceUnavailable,
                    Some("instructions"),
                    format!(
                        "Step {} needs a {} (\"{keyword}\"), which the user does not have",
                        i + 1,
                        appliance.label()
                    ),
                    format!(
                        "Rewrite step {} without a {}; the user has: {available}.",
                        i + 1,
                        appliance.label()
                    ),
                ));
            }
        }
    }

    ValidationResult::from_violations(violations)
}
