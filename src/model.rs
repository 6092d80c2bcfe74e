use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::normalize::normalize_key;

/// Allergens a profile can flag. The vocabulary is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergyKey {
    Nuts,
    Peanuts,
    TreeNuts,
    Dairy,
    Eggs,
    Gluten,
    Soy,
    Fish,
    Shellfish,
    Sesame,
}

impl AllergyKey {
    pub const ALL: [AllergyKey; 10] = [
        AllergyKey::Nuts,
        AllergyKey::Peanuts,
        AllergyKey::TreeNuts,
        AllergyKey::Dairy,
        AllergyKey::Eggs,
        AllergyKey::Gluten,
        AllergyKey::Soy,
        AllergyKey::Fish,
        AllergyKey::Shellfish,
        AllergyKey::Sesame,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            AllergyKey::Nuts => "nuts",
            AllergyKey::Peanuts => "peanuts",
            AllergyKey::TreeNuts => "tree_nuts",
            AllergyKey::Dairy => "dairy",
            AllergyKey::Eggs => "eggs",
            AllergyKey::Gluten => "gluten",
            AllergyKey::Soy => "soy",
            AllergyKey::Fish => "fish",
            AllergyKey::Shellfish => "shellfish",
            AllergyKey::Sesame => "sesame",
        }
    }

    /// Human readable name, as it should appear in a warning
    pub fn label(&self) -> &'static str {
        match self {
            AllergyKey::TreeNuts => "tree nuts",
            other => other.key(),
        }
    }
}

impl fmt::Display for AllergyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AllergyKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        AllergyKey::ALL
            .into_iter()
            .find(|a| a.key() == key)
            .ok_or_else(|| format!("unknown allergy '{}'", s.trim()))
    }
}

/// Kitchen appliances a profile can own. The vocabulary is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceKey {
    Oven,
    Stovetop,
    Microwave,
    AirFryer,
    SlowCooker,
    PressureCooker,
    Blender,
    FoodProcessor,
    Grill,
    StandMixer,
}

impl ApplianceKey {
    pub const ALL: [ApplianceKey; 10] = [
        ApplianceKey::Oven,
        ApplianceKey::Stovetop,
        ApplianceKey::Microwave,
        ApplianceKey::AirFryer,
        ApplianceKey::SlowCooker,
        ApplianceKey::PressureCooker,
        ApplianceKey::Blender,
        ApplianceKey::FoodProcessor,
        ApplianceKey::Grill,
        ApplianceKey::StandMixer,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ApplianceKey::Oven => "oven",
            ApplianceKey::Stovetop => "stovetop",
            ApplianceKey::Microwave => "microwave",
            ApplianceKey::AirFryer => "air_fryer",
            ApplianceKey::SlowCooker => "slow_cooker",
            ApplianceKey::PressureCooker => "pressure_cooker",
            ApplianceKey::Blender => "blender",
            ApplianceKey::FoodProcessor => "food_processor",
            ApplianceKey::Grill => "grill",
            ApplianceKey::StandMixer => "stand_mixer",
        }
    }

    pub fn label(&self) -> String {
        self.key().replace('_', " ")
    }
}

impl fmt::Display for ApplianceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for ApplianceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        ApplianceKey::ALL
            .into_iter()
            .find(|a| a.key() == key)
            .ok_or_else(|| format!("unknown appliance '{}'", s.trim()))
    }
}

/// Snapshot of a user's constraints for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub allergies: BTreeSet<AllergyKey>,
    #[serde(default)]
    pub appliances: BTreeSet<ApplianceKey>,
    #[serde(default)]
    pub preferences: String,
}

impl UserProfile {
    /// Build a profile from free-form keys, rejecting anything outside the vocabularies
    pub fn from_keys<A, P>(
        allergies: A,
        appliances: P,
        preferences: impl Into<String>,
    ) -> Result<Self, String>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let allergies = allergies
            .into_iter()
            .map(|a| a.as_ref().parse())
            .collect::<Result<BTreeSet<AllergyKey>, _>>()?;
        let appliances = appliances
            .into_iter()
            .map(|a| a.as_ref().parse())
            .collect::<Result<BTreeSet<ApplianceKey>, _>>()?;

        Ok(UserProfile {
            allergies,
            appliances,
            preferences: preferences.into(),
        })
    }
}

/// A candidate recipe. Every extraction or repair produces a new draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl RecipeDraft {
    /// No title, ingredients or steps: nothing the user could be talking about
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.ingredients.iter().all(|i| i.trim().is_empty())
            && self.instructions.iter().all(|s| s.trim().is_empty())
    }

    /// Plain-text rendering used inside generation prompts
    pub fn to_prompt_text(&self) -> String {
        let mut out = format!("Title: {}\n", self.title);
        if !self.description.is_empty() {
            out.push_str(&format!("Description: {}\n", self.description));
        }
        out.push_str("Ingredients:\n");
        for ingredient in &self.ingredients {
            out.push_str(&format!("- {ingredient}\n"));
        }
        out.push_str("Instructions:\n");
        for (i, step) in self.instructions.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }
        out
    }
}

/// What the user's current message asks the system to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    FirstMessageLink,
    FirstMessageFreeText,
    FirstMessageCompleteRecipe,
    FirstMessageQuery,
    Question,
    Modification,
    Clarification,
}

impl IntentKind {
    pub const ALL: [IntentKind; 7] = [
        IntentKind::FirstMessageLink,
        IntentKind::FirstMessageFreeText,
        IntentKind::FirstMessageCompleteRecipe,
        IntentKind::FirstMessageQuery,
        IntentKind::Question,
        IntentKind::Modification,
        IntentKind::Clarification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::FirstMessageLink => "first_message_link",
            IntentKind::FirstMessageFreeText => "first_message_free_text",
            IntentKind::FirstMessageCompleteRecipe => "first_message_complete_recipe",
            IntentKind::FirstMessageQuery => "first_message_query",
            IntentKind::Question => "question",
            IntentKind::Modification => "modification",
            IntentKind::Clarification => "clarification",
        }
    }

    pub fn is_first_message(&self) -> bool {
        matches!(
            self,
            IntentKind::FirstMessageLink
                | IntentKind::FirstMessageFreeText
                | IntentKind::FirstMessageCompleteRecipe
                | IntentKind::FirstMessageQuery
        )
    }
}

impl FromStr for IntentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        IntentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| format!("unknown intent '{}'", s.trim()))
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// Always within `[0, 1]`
    pub confidence: f64,
    /// Empty unless `kind` is `FirstMessageLink`
    pub detected_url: String,
    pub reasoning: String,
}

/// What the conversation so far implies about the current turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub is_first_message: bool,
    pub previous_topics: Vec<String>,
    pub recent_changes: Vec<String>,
    pub tone: String,
    pub greeting_needed: bool,
}

impl ConversationContext {
    pub fn first_message() -> Self {
        ConversationContext {
            is_first_message: true,
            previous_topics: Vec::new(),
            recent_changes: Vec::new(),
            tone: "friendly".to_string(),
            greeting_needed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingEmoji,
    GenericWarning,
    UnexpectedAllergen,
    NoIngredients,
    AllergenNotInInstructions,
    MissingRequestedIngredient,
    NonMetricUnit,
    MissingField,
    ApplianceUnavailable,
    PreferenceConflict,
    ValidatorError,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::MissingEmoji => "missing_emoji",
            ViolationKind::GenericWarning => "generic_warning",
            ViolationKind::UnexpectedAllergen => "unexpected_allergen",
            ViolationKind::NoIngredients => "no_ingredients",
            ViolationKind::AllergenNotInInstructions => "allergen_not_in_instructions",
            ViolationKind::MissingRequestedIngredient => "missing_requested_ingredient",
            ViolationKind::NonMetricUnit => "non_metric_unit",
            ViolationKind::MissingField => "missing_field",
            ViolationKind::ApplianceUnavailable => "appliance_unavailable",
            ViolationKind::PreferenceConflict => "preference_conflict",
            ViolationKind::ValidatorError => "validator_error",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed rule. Created fresh on every validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
    pub field: Option<String>,
    pub fix_instruction: String,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        field: Option<&str>,
        message: impl Into<String>,
        fix_instruction: impl Into<String>,
    ) -> Self {
        Violation {
            kind,
            message: message.into(),
            field: field.map(str::to_string),
            fix_instruction: fix_instruction.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
    pub fix_instructions: String,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self::from_violations(Vec::new())
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let fix_instructions = violations
            .iter()
            .map(|v| format!("- {}", v.fix_instruction))
            .collect::<Vec<_>>()
            .join("\n");

        ValidationResult {
            valid: violations.is_empty(),
            violations,
            fix_instructions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allergy_key_parsing() {
        assert_eq!("tree nuts".parse::<AllergyKey>(), Ok(AllergyKey::TreeNuts));
        assert_eq!(" Dairy ".parse::<AllergyKey>(), Ok(AllergyKey::Dairy));
        assert!("chocolate".parse::<AllergyKey>().is_err());
    }

    #[test]
    fn test_appliance_key_parsing() {
        assert_eq!("Air-Fryer".parse::<ApplianceKey>(), Ok(ApplianceKey::AirFryer));
        assert_eq!(ApplianceKey::SlowCooker.label(), "slow cooker");
    }

    #[test]
    fn test_profile_from_keys_rejects_unknown() {
        let profile = UserProfile::from_keys(["nuts", "dairy"], ["oven"], "vegetarian").unwrap();
        assert_eq!(profile.allergies.len(), 2);
        assert!(profile.appliances.contains(&ApplianceKey::Oven));

        let err = UserProfile::from_keys(["moon dust"], Vec::<String>::new(), "").unwrap_err();
        assert!(err.contains("moon dust"));
    }

    #[test]
    fn test_validation_result_aggregates_fixes() {
        let result = ValidationResult::from_violations(vec![
            Violation::new(ViolationKind::MissingField, Some("title"), "no title", "Add a title"),
            Violation::new(ViolationKind::NonMetricUnit, None, "cups", "Use ml"),
        ]);
        assert!(!result.valid);
        assert_eq!(result.fix_instructions, "- Add a title\n- Use ml");
        assert!(ValidationResult::valid().valid);
    }

    #[test]
    fn test_intent_kind_round_trip_names() {
        for kind in IntentKind::ALL {
            assert_eq!(kind.as_str().parse::<IntentKind>(), Ok(kind));
        }
        assert!(IntentKind::FirstMessageQuery.is_first_message());
        assert!(!IntentKind::Clarification.is_first_message());
    }
}
