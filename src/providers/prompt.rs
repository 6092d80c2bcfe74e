//! Instruction sets and output schemas for every generation task.
//!
//! The instruction texts live in `prompts/*.txt` and are embedded at compile
//! time with `include_str!`, so they can be edited without Rust string syntax.

use serde_json::{json, Value};

use super::GenerationRequest;
use crate::model::{IntentKind, RecipeDraft, UserProfile, Violation};

pub const GENERATE_PROMPT: &str = include_str!("prompts/generate.txt");
pub const STRUCTURE_PROMPT: &str = include_str!("prompts/structure.txt");
pub const REPAIR_PROMPT: &str = include_str!("prompts/repair.txt");
pub const MODIFY_PROMPT: &str = include_str!("prompts/modify.txt");
pub const CLASSIFY_PROMPT: &str = include_str!("prompts/classify.txt");
pub const CONTEXT_PROMPT: &str = include_str!("prompts/context.txt");
pub const ANSWER_PROMPT: &str = include_str!("prompts/answer.txt");

fn string_array() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

/// Schema of a recipe draft plus the ingredients the user asked for
pub fn recipe_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "description": {"type": "string"},
            "ingredients": string_array(),
            "instructions": string_array(),
            "requested_ingredients": string_array(),
        },
        "required": ["title", "description", "ingredients", "instructions", "requested_ingredients"],
        "additionalProperties": false,
    })
}

pub fn intent_schema() -> Value {
    let labels: Vec<&str> = IntentKind::ALL.iter().map(IntentKind::as_str).collect();
    json!({
        "type": "object",
        "properties": {
            "intent": {"type": "string", "enum": labels},
            "confidence": {"type": "number"},
            "detected_url": {"type": "string"},
            "reasoning": {"type": "string"},
        },
        "required": ["intent", "confidence", "detected_url", "reasoning"],
        "additionalProperties": false,
    })
}

pub fn context_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "is_first_message": {"type": "boolean"},
            "previous_topics": string_array(),
            "recent_changes": string_array(),
            "tone": {"type": "string"},
            "greeting_needed": {"type": "boolean"},
        },
        "required": ["is_first_message", "previous_topics", "recent_changes", "tone", "greeting_needed"],
        "additionalProperties": false,
    })
}

pub fn answer_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"answer": {"type": "string"}},
        "required": ["answer"],
        "additionalProperties": false,
    })
}

/// Human-readable summary of the profile for prompts
pub fn profile_block(profile: &UserProfile) -> String {
    fn list<T: ToString>(items: impl Iterator<Item = T>) -> String {
        let joined = items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
        if joined.is_empty() {
            "none".to_string()
        } else {
            joined
        }
    }

    let preferences = match profile.preferences.trim() {
        "" => "none",
        p => p,
    };

    format!(
        "Allergies: {}\nAppliances: {}\nPreferences: {}",
        list(profile.allergies.iter()),
        if profile.appliances.is_empty() {
            "not specified".to_string()
        } else {
            list(profile.appliances.iter())
        },
        preferences
    )
}

fn history_block(history: &str) -> &str {
    match history.trim() {
        "" => "(none)",
        h => h,
    }
}

/// Generate a recipe from a free-text request
pub fn generate_request(message: &str, profile: &UserProfile) -> GenerationRequest {
    GenerationRequest::new(
        format!("User profile:\n{}\n\nRequest:\n{}", profile_block(profile), message.trim()),
        GENERATE_PROMPT,
        recipe_schema(),
    )
}

/// Structure recipe text that came from a page or was pasted
pub fn structure_request(source: &str, profile: &UserProfile) -> GenerationRequest {
    GenerationRequest::new(
        format!("User profile:\n{}\n\nRecipe:\n{}", profile_block(profile), source.trim()),
        STRUCTURE_PROMPT,
        recipe_schema(),
    )
}

/// Fix `violations` in `draft`. The numbered list keeps the validator order.
pub fn repair_request(
    draft: &RecipeDraft,
    violations: &[Violation],
    requested: &[String],
    profile: &UserProfile,
) -> GenerationRequest {
    let problems = violations
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{}. [{}] {}\n   Fix: {}", i + 1, v.kind, v.message, v.fix_instruction))
        .collect::<Vec<_>>()
        .join("\n");
    let requested = if requested.is_empty() {
        "none".to_string()
    } else {
        requested.join(", ")
    };

    GenerationRequest::new(
        format!(
            "User profile:\n{}\n\nIngredients the user asked for: {requested}\n\nCurrent recipe:\n{}\nProblems:\n{problems}",
            profile_block(profile),
            draft.to_prompt_text()
        ),
        REPAIR_PROMPT,
        recipe_schema(),
    )
}

/// Apply the user's change request to `draft`
pub fn modify_request(
    draft: &RecipeDraft,
    message: &str,
    accepted: &[String],
    profile: &UserProfile,
) -> GenerationRequest {
    GenerationRequest::new(
        format!(
            "User profile:\n{}\n\nIngredients the user already accepted: {}\n\nCurrent recipe:\n{}\nChange request:\n{}",
            profile_block(profile),
            if accepted.is_empty() { "none".to_string() } else { accepted.join(", ") },
            draft.to_prompt_text(),
            message.trim()
        ),
        MODIFY_PROMPT,
        recipe_schema(),
    )
}

pub fn classify_request(message: &str, history: &str, recipe_state: Option<&RecipeDraft>) -> GenerationRequest {
    let recipe = recipe_state.map_or_else(|| "(none)".to_string(), RecipeDraft::to_prompt_text);
    GenerationRequest::new(
        format!(
            "Conversation history:\n{}\n\nCurrent recipe:\n{recipe}\n\nLatest message:\n{}",
            history_block(history),
            message.trim()
        ),
        CLASSIFY_PROMPT,
        intent_schema(),
    )
}

pub fn context_request(history: &str) -> GenerationRequest {
    GenerationRequest::new(
        format!("Conversation history:\n{}", history_block(history)),
        CONTEXT_PROMPT,
        context_schema(),
    )
}

pub fn answer_request(
    message: &str,
    history: &str,
    recipe_state: Option<&RecipeDraft>,
    profile: &UserProfile,
) -> GenerationRequest {
    let recipe = recipe_state.map_or_else(|| "(none)".to_string(), RecipeDraft::to_prompt_text);
    GenerationRequest::new(
        format!(
            "User profile:\n{}\n\nConversation history:\n{}\n\nCurrent recipe:\n{recipe}\n\nQuestion:\n{}",
            profile_block(profile),
            history_block(history),
            message.trim()
        ),
        ANSWER_PROMPT,
        answer_schema(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViolationKind;

    #[test]
    fn test_prompts_are_embedded() {
        for prompt in [
            GENERATE_PROMPT,
            STRUCTURE_PROMPT,
            REPAIR_PROMPT,
            MODIFY_PROMPT,
            CLASSIFY_PROMPT,
            CONTEXT_PROMPT,
            ANSWER_PROMPT,
        ] {
            assert!(prompt.contains("JSON object"));
        }
        assert!(REPAIR_PROMPT.contains("⚠️"));
        assert!(CLASSIFY_PROMPT.contains("first_message_link"));
    }

    #[test]
    fn test_intent_schema_lists_all_labels() {
        let schema = intent_schema();
        assert_eq!(schema["properties"]["intent"]["enum"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_profile_block() {
        let profile = UserProfile::from_keys(["tree nuts"], Vec::<String>::new(), "vegetarian").unwrap();
        let block = profile_block(&profile);
        assert!(block.contains("Allergies: tree nuts"));
        assert!(block.contains("Appliances: not specified"));
        assert!(block.contains("Preferences: vegetarian"));
    }

    #[test]
    fn test_repair_request_numbers_violations_in_order() {
        let draft = RecipeDraft {
            title: "Noodles".to_string(),
            instructions: vec!["Add peanuts".to_string()],
            ..Default::default()
        };
        let violations = vec![
            Violation::new(ViolationKind::MissingEmoji, Some("instructions"), "first", "fix one"),
            Violation::new(ViolationKind::NonMetricUnit, Some("ingredients"), "second", "fix two"),
        ];

        let request = repair_request(&draft, &violations, &["peanuts".to_string()], &UserProfile::default());
        let first = request.prompt.find("1. [missing_emoji] first").unwrap();
        let second = request.prompt.find("2. [non_metric_unit] second").unwrap();
        assert!(first < second);
        assert!(request.prompt.contains("asked for: peanuts"));
    }
}
