//! Non-streaming calls against the mock backend

mod harness;

use harness::config::ConfigBuilder;
use harness::mock_backend::{MockBackend, Reply};
use http::{HeaderName, HeaderValue, StatusCode};
use kaiwu_core::HeaderOverrides;
use kaiwu_llm::protocol::chat::ErrorCode;
use kaiwu_llm::{CallOptions, CallWarning, ConversionError, CustomProvider, FinishReason, LanguageModel, LlmError, Message, Usage};
use serde_json::json;

fn prompt() -> Vec<Message> {
    vec![Message::system("You are helpful"), Message::user_text("Hi")]
}

fn completion(content: &str, finish_reason: &str) -> serde_json::Value {
    json!({
        "id": "chat-1",
        "created": 1_700_000_000,
        "model": "mock-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": finish_reason
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
    })
}

#[tokio::test]
async fn generate_returns_text_and_usage() {
    let mock = MockBackend::start().await.unwrap();
    mock.reply_completions(Reply::ok(completion("Hello!", "stop")));

    let config = ConfigBuilder::new(&mock.base_url()).build();
    let model = CustomProvider::new(&config.provider).unwrap().default_model().unwrap();

    let result = model.generate(CallOptions::new(prompt())).await.unwrap();

    assert_eq!(result.text(), "Hello!");
    assert_eq!(result.finish_reason, FinishReason::Stop);
    assert_eq!(
        result.usage,
        Usage {
            input_tokens: Some(10),
            output_tokens: Some(20),
            total_tokens: Some(30),
        }
    );
    assert!(result.warnings.is_empty());
    assert_eq!(result.response.body.id.as_deref(), Some("chat-1"));

    let request = mock.single_request();
    assert_eq!(request.path, "/api/chat/completions");
    assert_eq!(request.headers["authorization"], "Bearer test-key");
    assert_eq!(
        request.body,
        json!({
            "model": "mock-model",
            "messages": [
                {"role": "system", "content": "You are helpful"},
                {"role": "user", "content": [{"type": "text", "text": "Hi"}]}
            ]
        })
    );
}

#[tokio::test]
async fn unsupported_options_become_warnings() {
    let mock = MockBackend::start().await.unwrap();
    mock.reply_completions(Reply::ok(completion("ok", "length")));

    let config = ConfigBuilder::new(&mock.base_url()).build();
    let model = CustomProvider::new(&config.provider).unwrap().default_model().unwrap();

    let mut options = CallOptions::new(prompt()).with_temperature(0.5).with_max_output_tokens(64);
    options.top_k = Some(4);
    options.seed = Some(7);

    let result = model.generate(options).await.unwrap();

    assert_eq!(result.finish_reason, FinishReason::Length);
    assert_eq!(
        result.warnings,
        vec![
            CallWarning::UnsupportedSetting {
                setting: "topK".to_owned(),
                details: None,
            },
            CallWarning::UnsupportedSetting {
                setting: "seed".to_owned(),
                details: None,
            },
        ]
    );

    let body = mock.single_request().body;
    assert_eq!(body["temperature"], 0.5);
    assert_eq!(body["max_tokens"], 64);
    assert!(body.get("top_k").is_none());
    assert!(body.get("seed").is_none());
}

#[tokio::test]
async fn structured_error_body_becomes_api_error() {
    let mock = MockBackend::start().await.unwrap();
    mock.reply_completions(Reply::Json {
        status: StatusCode::UNAUTHORIZED,
        body: json!({"error": {"message": "bad key", "code": "1001"}}),
    });

    let config = ConfigBuilder::new(&mock.base_url()).build();
    let model = CustomProvider::new(&config.provider).unwrap().default_model().unwrap();

    let err = model.generate(CallOptions::new(prompt())).await.unwrap_err();

    match err {
        LlmError::Api { status, message, code } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "bad key");
            assert_eq!(code, Some(ErrorCode::Text("1001".to_owned())));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn plain_error_body_becomes_transport_error() {
    let mock = MockBackend::start().await.unwrap();
    mock.reply_completions(Reply::status(StatusCode::BAD_GATEWAY, "upstream exploded"));

    let config = ConfigBuilder::new(&mock.base_url()).build();
    let model = CustomProvider::new(&config.provider).unwrap().default_model().unwrap();

    let err = model.generate(CallOptions::new(prompt())).await.unwrap_err();

    assert!(
        matches!(err, LlmError::Transport { status: StatusCode::BAD_GATEWAY, ref body } if body == "upstream exploded"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn malformed_success_body_is_rejected() {
    let mock = MockBackend::start().await.unwrap();
    mock.reply_completions(Reply::ok(json!({"choices": "nope"})));

    let config = ConfigBuilder::new(&mock.base_url()).build();
    let model = CustomProvider::new(&config.provider).unwrap().default_model().unwrap();

    let err = model.generate(CallOptions::new(prompt())).await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn unsupported_role_fails_before_any_request() {
    let mock = MockBackend::start().await.unwrap();

    let config = ConfigBuilder::new(&mock.base_url()).build();
    let model = CustomProvider::new(&config.provider).unwrap().default_model().unwrap();

    let prompt = vec![Message::Assistant {
        content: vec![kaiwu_llm::ContentPart::text("earlier answer")],
    }];
    let err = model.generate(CallOptions::new(prompt)).await.unwrap_err();

    assert!(matches!(
        err,
        LlmError::Conversion(ConversionError::UnsupportedRole { .. })
    ));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn headers_are_layered() {
    let mock = MockBackend::start().await.unwrap();
    mock.reply_completions(Reply::ok(completion("ok", "stop")));

    let config = ConfigBuilder::new(&mock.base_url())
        .with_header("X-Tenant", "acme")
        .with_header("X-Region", "eu")
        .build();
    let model = CustomProvider::new(&config.provider).unwrap().default_model().unwrap();

    let overrides = HeaderOverrides::new()
        .set(HeaderName::from_static("x-region"), HeaderValue::from_static("us"))
        .remove(HeaderName::from_static("x-tenant"));
    model
        .generate(CallOptions::new(prompt()).with_headers(overrides))
        .await
        .unwrap();

    let headers = mock.single_request().headers;
    assert_eq!(headers["authorization"], "Bearer test-key");
    assert_eq!(headers["x-region"], "us");
    assert!(headers.get("x-tenant").is_none());
}

#[tokio::test]
async fn missing_api_key_is_reported() {
    let mock = MockBackend::start().await.unwrap();

    let config = ConfigBuilder::new(&mock.base_url())
        .with_api_key_env("KAIWU_TEST_UNSET_KEY")
        .build();
    let model = CustomProvider::new(&config.provider).unwrap().default_model().unwrap();

    let err = model.generate(CallOptions::new(prompt())).await.unwrap_err();

    assert!(matches!(err, LlmError::MissingApiKey { ref env_var } if env_var == "KAIWU_TEST_UNSET_KEY"));
    assert!(err.to_string().contains("KAIWU_TEST_UNSET_KEY"));
    assert!(mock.requests().is_empty());
}
