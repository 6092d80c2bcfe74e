#![allow(dead_code)]

use async_trait::async_trait;
use recipe_guard::providers::{prompt, GenerationRequest};
use recipe_guard::{GenerationError, LlmProvider};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Answers classification, context and Q&A calls with fixed objects and
/// hands out queued recipe objects, in order, for every other call.
pub struct ScriptedProvider {
    intent: Option<Value>,
    context: Value,
    answer: Value,
    recipes: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new(intent: &str) -> Self {
        ScriptedProvider {
            intent: Some(json!({"intent": intent, "confidence": 0.9, "reasoning": "scripted"})),
            context: json!({"is_first_message": false, "tone": "friendly", "greeting_needed": false}),
            answer: json!({"answer": "Yes, that works."}),
            recipes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Classification calls fail
    pub fn failing_classifier() -> Self {
        ScriptedProvider {
            intent: None,
            ..Self::new("question")
        }
    }

    pub fn with_recipe(self, recipe: Value) -> Self {
        self.recipes.lock().unwrap().push_back(recipe);
        self
    }

    pub fn with_answer(mut self, answer: &str) -> Self {
        self.answer = json!({ "answer": answer });
        self
    }

    /// Instruction sets of every call, in call order
    pub fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.instructions.clone())
            .collect()
    }

    pub fn count(&self, instructions: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == instructions).count()
    }

    pub fn last_prompt(&self, instructions: &str) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.instructions == instructions)
            .map(|r| r.prompt.clone())
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());

        let instructions = request.instructions.as_str();
        if instructions == prompt::CLASSIFY_PROMPT {
            return self.intent.clone().ok_or_else(|| GenerationError::Api {
                status: 503,
                body: "classifier unavailable".to_string(),
            });
        }
        if instructions == prompt::CONTEXT_PROMPT {
            return Ok(self.context.clone());
        }
        if instructions == prompt::ANSWER_PROMPT {
            return Ok(self.answer.clone());
        }

        self.recipes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::Api {
                status: 500,
                body: "no scripted recipe left".to_string(),
            })
    }
}

pub fn recipe_page(json_ld: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
        <html>
        <head>
            <title>Recipe Page</title>
            <script type="application/ld+json">{}</script>
        </head>
        <body><h1>Recipe</h1></body>
        </html>"#,
        json_ld
    )
}

pub const LENTIL_SOUP_LD: &str = r#"{
    "@context": "https://schema.org",
    "@type": "Recipe",
    "name": "Red Lentil Soup",
    "description": "A quick weeknight soup",
    "recipeIngredient": ["200 g red lentils", "1 onion", "1 l vegetable stock"],
    "recipeInstructions": [
        {"@type": "HowToStep", "text": "Chop the onion."},
        {"@type": "HowToStep", "text": "Simmer the lentils in the stock for 20 minutes."}
    ]
}"#;
