use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use paperchat::config::LlmConfig;
use paperchat::error::PaperChatError;
use paperchat::llm::{GenerationService, LlmApiClient, LlmBackend, LlmProvider};
use paperchat::models::ContentCategory;
use paperchat::services::RequirementsAnalyzer;

fn llm_config(model: &str) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        api_key: Some("test-key".to_string()),
        base_url: None,
        timeout_secs: 30,
        max_retries: 3,
        enable_requirements_analysis: false,
        requirements_cache_size: 100,
        requirements_timeout_secs: 3,
    }
}

fn llm_config_with_base_url(model: &str, base_url: String, max_retries: u32) -> LlmConfig {
    LlmConfig {
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries,
        ..llm_config(model)
    }
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

fn api_error_body(message: &str, error_type: &str, code: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": serde_json::Value::Null,
            "code": code
        }
    })
}

fn mock_provider(server: &MockServer, max_retries: u32) -> LlmProvider {
    let config =
        llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), max_retries);
    LlmProvider::new(Some(&config))
}

#[test]
fn test_openai_provider_detection() {
    let config = llm_config("openai/gpt-4o");
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::OpenAI));
    assert!(provider.is_available());
}

#[test]
fn test_openrouter_provider_detection() {
    let config = llm_config("openrouter/openai/gpt-4o");
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::OpenRouter));
}

#[test]
fn test_ollama_provider_detection() {
    let config = llm_config("ollama/llama3.2");
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::Ollama));
}

#[test]
fn test_unknown_provider_needs_base_url() {
    let provider = LlmProvider::new(Some(&llm_config("mystery-model")));
    assert!(matches!(provider.backend(), LlmBackend::Unavailable { .. }));

    let mut config = llm_config("mystery-model");
    config.base_url = Some("http://localhost:8080/v1".to_string());
    let provider = LlmProvider::new(Some(&config));
    assert_eq!(
        provider.backend(),
        &LlmBackend::OpenAICompatible {
            base_url: "http://localhost:8080/v1".to_string()
        }
    );
}

#[test]
fn test_unavailable_provider() {
    let provider = LlmProvider::new(None);

    assert!(matches!(provider.backend(), LlmBackend::Unavailable { .. }));
    assert!(!provider.is_available());
    assert!(!GenerationService::is_available(&provider));
}

#[test]
fn test_provider_clone() {
    let config = llm_config("openrouter/openai/gpt-4o-mini");
    let provider = LlmProvider::new(Some(&config));
    let cloned = provider.clone();

    assert!(matches!(cloned.backend(), LlmBackend::OpenRouter));
    assert_eq!(
        cloned.config().map(|c| c.model.as_str()),
        Some(config.model.as_str())
    );
}

#[test]
fn test_api_client_strips_provider_prefix() {
    let config = llm_config("openrouter/openai/gpt-4o-mini");

    match LlmApiClient::new(&config) {
        Ok(client) => assert_eq!(client.model(), "openai/gpt-4o-mini"),
        Err(error) => panic!("Expected API client creation to succeed, got: {error}"),
    }
}

#[tokio::test]
async fn test_complete_returns_response_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello from mock")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = mock_provider(&server, 1);

    match provider.complete("Hello", None).await {
        Ok(value) => assert_eq!(value, "Hello from mock"),
        Err(error) => panic!("Expected completion to succeed, got: {error}"),
    }
}

#[tokio::test]
async fn test_generate_makes_a_single_attempt() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_mock = Arc::clone(&attempts);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(move |_request: &Request| {
            attempts_for_mock.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(500).set_body_string("upstream temporary failure")
        })
        .mount(&server)
        .await;

    let provider = mock_provider(&server, 3);

    let result = provider.generate("Explain Figure 3", 0.2, 500).await;

    assert!(matches!(result, Err(PaperChatError::Generation(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_json_completion_retries_server_errors() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_mock = Arc::clone(&attempts);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(move |_request: &Request| {
            if attempts_for_mock.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(500).set_body_string("upstream temporary failure")
            } else {
                ResponseTemplate::new(200).set_body_json(completion_body("{\"ok\": true}"))
            }
        })
        .mount(&server)
        .await;

    let provider = mock_provider(&server, 2);

    match provider.complete_json("Retry test", None).await {
        Ok(value) => assert_eq!(value, json!({"ok": true})),
        Err(error) => panic!("Expected retry completion to succeed, got: {error}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rate_limit_handling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(api_error_body(
                    "Rate limit exceeded",
                    "insufficient_quota",
                    "insufficient_quota",
                )),
        )
        .mount(&server)
        .await;

    let provider = mock_provider(&server, 1);

    let result = provider.complete("Rate limit test", None).await;

    assert!(matches!(
        result,
        Err(PaperChatError::LlmRateLimit { retry_after: None })
    ));
}

#[tokio::test]
async fn test_auth_error_marks_llm_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(api_error_body(
            "Invalid API key",
            "invalid_request_error",
            "invalid_api_key",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = mock_provider(&server, 3);

    match provider.complete_json("Auth test", None).await {
        Err(PaperChatError::LlmUnavailable(message)) => {
            assert!(message.to_lowercase().contains("authentication failed"));
        }
        other => panic!("Expected auth error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_prompt_validation() {
    let provider = LlmProvider::new(Some(&llm_config("openai/gpt-4o-mini")));

    match provider.complete("   ", None).await {
        Err(PaperChatError::Validation(message)) => {
            assert!(message.contains("Prompt cannot be empty"));
        }
        other => panic!("Expected Validation error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_hosted_provider_without_key_is_unavailable() {
    let mut config = llm_config("openai/gpt-4o");
    config.api_key = None;
    let provider = LlmProvider::new(Some(&config));

    let result = provider.complete("Hello", None).await;
    assert!(matches!(result, Err(PaperChatError::LlmUnavailable(_))));
}

#[tokio::test]
async fn test_complete_json_unavailable_provider() {
    let provider = LlmProvider::new(None);
    let result = provider.complete_json("test prompt", None).await;
    assert!(matches!(result, Err(PaperChatError::LlmUnavailable(_))));
}

#[tokio::test]
async fn test_requirements_analysis_parses_and_caches() {
    let server = MockServer::start().await;
    let fenced = "```json\n{\"weights\": {\"tables\": 0.9, \"bogus\": 1.0}, \"include_references\": true}\n```";
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(fenced)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config =
        llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 0);
    config.enable_requirements_analysis = true;
    let analyzer = RequirementsAnalyzer::new(LlmProvider::new(Some(&config)));
    assert!(analyzer.is_enabled());

    let requirements = analyzer
        .analyze("Which table has the baseline numbers?")
        .await
        .expect("requirements");
    assert!(requirements.include_references);
    assert!(!requirements.include_authors);
    assert_eq!(
        requirements.category_weights(),
        vec![(ContentCategory::Tables, 0.9)]
    );

    // Same question, different casing: served from cache
    let cached = analyzer
        .analyze("  which table has the BASELINE numbers?")
        .await;
    assert_eq!(cached, Some(requirements));
}

#[tokio::test]
async fn test_requirements_analysis_falls_back_on_bad_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("tables, mostly")),
        )
        .mount(&server)
        .await;

    let mut config =
        llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 0);
    config.enable_requirements_analysis = true;
    let analyzer = RequirementsAnalyzer::new(LlmProvider::new(Some(&config)));

    assert!(analyzer.analyze("Which table has the baseline?").await.is_none());
}

#[tokio::test]
async fn test_requirements_analysis_skips_trivial_queries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config =
        llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 0);
    config.enable_requirements_analysis = true;
    let analyzer = RequirementsAnalyzer::new(LlmProvider::new(Some(&config)));

    assert!(analyzer.analyze("hi").await.is_none());
    assert!(analyzer.analyze(&"x".repeat(1001)).await.is_none());
}

#[tokio::test]
async fn test_requirements_analysis_disabled_by_default() {
    let analyzer = RequirementsAnalyzer::new(LlmProvider::new(Some(&llm_config("openai/gpt-4o"))));
    assert!(!analyzer.is_enabled());
    assert!(analyzer.analyze("Which table has the baseline?").await.is_none());
}
