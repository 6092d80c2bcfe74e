//! Validate, patch, re-validate: the bounded repair loop.

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use super::request_recipe;
use crate::model::{RecipeDraft, UserProfile, Violation};
use crate::providers::{prompt, LlmProvider};
use crate::tables::RuleTables;
use crate::validators::{self, ValidationInput};

/// Repair calls allowed per draft
pub const MAX_REPAIR_ITERATIONS: usize = 3;

/// The last draft and whatever it still violates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairOutcome {
    pub draft: RecipeDraft,
    /// Empty when the draft is compliant
    pub violations: Vec<Violation>,
    /// Repair calls that produced a new draft
    pub iterations: usize,
}

impl RepairOutcome {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

pub struct RepairLoop {
    provider: Arc<dyn LlmProvider>,
    tables: Arc<RuleTables>,
}

impl RepairLoop {
    pub fn new(provider: Arc<dyn LlmProvider>, tables: Arc<RuleTables>) -> Self {
        Self { provider, tables }
    }

    /// Run all six checkers concurrently and merge their findings in checker order
    pub async fn validate(
        &self,
        draft: &RecipeDraft,
        profile: &UserProfile,
        requested: &[String],
    ) -> Vec<Violation> {
        let input = Arc::new(ValidationInput {
            draft: draft.clone(),
            profile: profile.clone(),
            requested_ingredients: requested.to_vec(),
            tables: Arc::clone(&self.tables),
        });
        let results = validators::run_all(input).await;
        validators::aggregate(&results)
    }

    /// Validate `draft` and repair it until it is compliant or the repair
    /// budget is spent. Repairs run one at a time; each one produces a new draft.
    ///
    /// A failed repair call ends the loop early with the draft it was given.
    pub async fn run(
        &self,
        draft: RecipeDraft,
        profile: &UserProfile,
        requested: &[String],
    ) -> RepairOutcome {
        let mut draft = draft;
        let mut iterations = 0;

        loop {
            let violations = self.validate(&draft, profile, requested).await;
            if violations.is_empty() {
                info!(
                    "'{}' passed every check after {} repair(s)",
                    draft.title, iterations
                );
                return RepairOutcome {
                    draft,
                    violations,
                    iterations,
                };
            }

            debug!(
                "{} violation(s) after {} repair(s): {}",
                violations.len(),
                iterations,
                violations
                    .iter()
                    .map(|v| v.kind.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            if iterations >= MAX_REPAIR_ITERATIONS {
                warn!(
                    "Repair budget spent with {} violation(s) left",
                    violations.len()
                );
                return RepairOutcome {
                    draft,
                    violations,
                    iterations,
                };
            }

            let request = prompt::repair_request(&draft, &violations, requested, profile);
            match request_recipe(self.provider.as_ref(), &request).await {
                Ok((repaired, _)) => {
                    iterations += 1;
                    draft = repaired;
                }
                Err(e) => {
                    warn!("Repair call failed, keeping the last draft: {}", e);
                    return RepairOutcome {
                        draft,
                        violations,
                        iterations,
                    };
                }
            }
        }
    }
}
