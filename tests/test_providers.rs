use recipe_guard::analysis::IntentClassifier;
use recipe_guard::providers::{prompt, ProviderFactory};
use recipe_guard::{
    AnthropicProvider, FallbackProvider, GenerationError, IntentKind, LlmProvider, OpenAIProvider,
    PipelineError, UserProfile,
};
use serde_json::json;
use std::sync::Arc;

fn openai(base_url: String) -> Box<dyn LlmProvider> {
    Box::new(OpenAIProvider::with_base_url(
        "test-key".to_string(),
        base_url,
        "gpt-4.1-mini".to_string(),
    ))
}

fn anthropic(base_url: String) -> Box<dyn LlmProvider> {
    Box::new(AnthropicProvider::with_base_url(
        "test-key".to_string(),
        base_url,
        "claude-sonnet-4-5".to_string(),
    ))
}

#[tokio::test]
async fn test_link_classification_through_fallback_chain() {
    let mut openai_server = mockito::Server::new_async().await;
    let openai_mock = openai_server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body(r#"{"error": {"message": "overloaded"}}"#)
        .expect(2)
        .create_async()
        .await;

    let mut anthropic_server = mockito::Server::new_async().await;
    let reply = json!({
        "intent": "first_message_link",
        "confidence": 0.97,
        "detected_url": "https://allrecipes.com/recipe/1",
        "reasoning": "The message is a single recipe URL"
    });
    let anthropic_mock = anthropic_server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .with_status(200)
        .with_body(
            json!({"content": [{"type": "text", "text": reply.to_string()}]}).to_string(),
        )
        .create_async()
        .await;

    let chain = FallbackProvider::from_providers(
        vec![openai(openai_server.url()), anthropic(anthropic_server.url())],
        2,
        0,
    );
    let classifier = IntentClassifier::new(Arc::new(chain));
    let intent = classifier
        .classify("https://allrecipes.com/recipe/1", "", None)
        .await
        .unwrap();

    openai_mock.assert_async().await;
    anthropic_mock.assert_async().await;
    assert_eq!(intent.kind, IntentKind::FirstMessageLink);
    assert_eq!(intent.detected_url, "https://allrecipes.com/recipe/1");
    assert_eq!(intent.confidence, 0.97);
}

#[tokio::test]
async fn test_every_provider_failing_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _openai = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body("bad key")
        .create_async()
        .await;
    let _anthropic = server
        .mock("POST", "/v1/messages")
        .with_status(529)
        .with_body("overloaded")
        .create_async()
        .await;

    let chain = FallbackProvider::from_providers(vec![openai(server.url()), anthropic(server.url())], 1, 0);
    let request = prompt::generate_request("soup", &UserProfile::default());

    match chain.generate(&request).await {
        Err(GenerationError::AllProvidersFailed(details)) => {
            assert!(details.contains("openai"));
            assert!(details.contains("anthropic"));
        }
        other => panic!("expected AllProvidersFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_classifier_surfaces_generation_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .create_async()
        .await;

    let classifier = IntentClassifier::new(Arc::from(openai(server.url())));
    let result = classifier.classify("pasta tonight?", "", None).await;

    assert!(matches!(
        result,
        Err(PipelineError::Generation(GenerationError::Api { status: 500, .. }))
    ));
}

#[test]
fn test_factory_knows_both_providers() {
    assert_eq!(ProviderFactory::available_providers(), vec!["openai", "anthropic"]);
}
