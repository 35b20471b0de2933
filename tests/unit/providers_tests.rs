/*!
 * Tests for the provider implementations and the LLM name proposer
 */

use std::time::Duration;

use namekeep::errors::{ProposalFailure, ProviderError};
use namekeep::glossary::{GlossaryStore, NameProposer, ResolveOptions, TermResolution};
use namekeep::prompts::NamePromptTemplate;
use namekeep::providers::mock::{MockBehavior, MockProvider};
use namekeep::providers::ollama::{ChatMessage, ChatRequest, Ollama};
use namekeep::providers::{LlmNameProposer, Provider};

/// Test the Ollama provider against a live server
#[tokio::test]
#[ignore]
async fn test_ollama_provider_withLocalServer_shouldProposeName() {
    let endpoint = std::env::var("OLLAMA_ENDPOINT").unwrap_or_else(|_| "http://localhost:11434".to_string());
    let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "qwen2.5:7b".to_string());

    let ollama = Ollama::new(endpoint, model, 0.3, Duration::from_secs(60));
    ollama.test_connection().await.unwrap();

    let proposer = LlmNameProposer::new(ollama, "Chinese", "Vietnamese");
    let name = proposer.propose("葉陽").await.unwrap();
    assert!(!name.is_empty());

    println!("Ollama proposed: {}", name);
}

/// Test that an unreachable Ollama server is a connection error
#[tokio::test]
async fn test_ollama_testConnection_withUnreachableServer_shouldFail() {
    let ollama = Ollama::new("127.0.0.1:1", "qwen2.5:7b", 0.3, Duration::from_secs(2));
    let result = ollama.test_connection().await;
    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}

/// Test the Ollama chat request serialization
#[test]
fn test_ollama_chatRequest_withOptions_shouldSerialize() {
    let request = ChatRequest::new("qwen2.5:7b", vec![ChatMessage::user("葉陽")])
        .max_tokens(16)
        .temperature(0.1);

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["messages"][0]["content"], "葉陽");
    assert_eq!(json["options"]["num_predict"], 16);
    assert!(json["options"]["temperature"].as_f64().unwrap() < 0.11);
}

/// Test the Ollama endpoint normalization
#[test]
fn test_ollama_new_withTrailingSlash_shouldTrim() {
    let ollama = Ollama::new("https://ollama.example.com/", "qwen2.5:7b", 0.3, Duration::from_secs(5));
    assert_eq!(ollama.base_url(), "https://ollama.example.com");
    assert_eq!(ollama.model(), "qwen2.5:7b");
}

/// Test that mock clones share their request counter
#[tokio::test]
async fn test_mockProvider_clone_shouldShareRequestCount() {
    let provider = MockProvider::new(MockBehavior::Working);
    let clone = provider.clone();

    let request = provider.build_request("system", "葉陽");
    clone.complete(request).await.unwrap();

    assert_eq!(provider.request_count(), 1);
}

/// Test that the proposer sends the rendered system and user prompts
#[tokio::test]
async fn test_llmNameProposer_withCustomTemplate_shouldSendRenderedPrompts() {
    let provider = MockProvider::working().with_custom_response(|request| {
        if request.system.contains("Chinese to Vietnamese") && request.prompt == "Name: 王媽" {
            "Vương Ma".to_string()
        } else {
            format!("unexpected prompt: {}", request.prompt)
        }
    });
    let proposer = LlmNameProposer::new(provider, "Chinese", "Vietnamese")
        .with_template(NamePromptTemplate::new("Name: {term}"));

    assert_eq!(proposer.propose("王媽").await.unwrap(), "Vương Ma");
    assert_eq!(proposer.provider().request_count(), 1);
}

/// Test per-term failures when the store proposes through a flaky provider
#[tokio::test]
async fn test_llmNameProposer_withIntermittentProvider_shouldFailOnlyOneTerm() {
    let store = GlossaryStore::in_memory();
    let proposer = LlmNameProposer::new(MockProvider::intermittent(2), "Chinese", "Vietnamese");

    let outcome = store
        .resolve(1, ["A", "B", "C"], &proposer, &ResolveOptions::new())
        .await
        .unwrap();

    assert_eq!(outcome.target("A"), Some("Nhân Vật 1"));
    assert!(matches!(
        outcome.get("B"),
        Some(TermResolution::Failed(ProposalFailure::Provider(_)))
    ));
    assert_eq!(outcome.target("C"), Some("Nhân Vật 3"));
    assert_eq!(store.len(), 2);
}

/// Test that an empty reply is not stored as a translation
#[tokio::test]
async fn test_llmNameProposer_withEmptyProvider_shouldReportEmptyProposal() {
    let store = GlossaryStore::in_memory();
    let proposer = LlmNameProposer::new(MockProvider::empty(), "Chinese", "Vietnamese");

    let outcome = store
        .resolve(1, ["葉陽"], &proposer, &ResolveOptions::new())
        .await
        .unwrap();

    assert_eq!(
        outcome.get("葉陽"),
        Some(&TermResolution::Failed(ProposalFailure::EmptyProposal))
    );
    assert!(store.is_empty());
}

/// Test that a slow provider is cut off by the batch timeout
#[tokio::test]
async fn test_llmNameProposer_withSlowProvider_shouldTimeOut() {
    let store = GlossaryStore::in_memory();
    let proposer = LlmNameProposer::new(MockProvider::slow(500), "Chinese", "Vietnamese");

    let outcome = store
        .resolve(
            1,
            ["葉陽"],
            &proposer,
            &ResolveOptions::new().with_timeout(Duration::from_millis(20)),
        )
        .await
        .unwrap();

    assert!(matches!(
        outcome.get("葉陽"),
        Some(TermResolution::Failed(ProposalFailure::TimedOut(_)))
    ));
}
