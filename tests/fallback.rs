//! Fallback-chain behavior against simulated documentation backends.
//!
//! wiremock stands in for the remote inference API and the local Ollama
//! daemon, so each tier's failure mode (error status, timeout, missing
//! model) can be exercised without any real backend installed.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use code_narrator_rs::config::Config;
use code_narrator_rs::describer::{DocHint, DocMethod, DocSelector};
use code_narrator_rs::pipeline::Pipeline;
use code_narrator_rs::server::{router, AppState};

const CODE: &str = "def add(a, b):\n    return a + b";

/// Config with both backends pointed nowhere and no token.
fn base_config() -> Config {
    let mut config = Config::default();
    config.remote.token_env = "CODE_NARRATOR_TEST_TOKEN_THAT_IS_NEVER_SET".into();
    config.remote.model = "test-model".into();
    config.ollama.host = "http://127.0.0.1:1".into();
    config.ollama.instruct_model = "test-instruct".into();
    config.ollama.base_model = "test-base".into();
    config
}

fn with_remote(mut config: Config, server: &MockServer, token_env: &str) -> Config {
    std::env::set_var(token_env, "test-token");
    config.remote.endpoint = format!("{}/models", server.uri());
    config.remote.token_env = token_env.to_string();
    config
}

async fn mock_remote(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/models/test-model"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mock_ollama_model(server: &MockServer, model: &str, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({ "model": model })))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn remote_success_wins_the_chain() {
    let remote = MockServer::start().await;
    mock_remote(
        &remote,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!([{ "generated_text": "Adds two numbers." }])),
    )
    .await;

    let config = with_remote(base_config(), &remote, "CODE_NARRATOR_TEST_TOKEN_A");
    let selector = DocSelector::new(&config);

    let result = selector.describe(CODE, DocHint::Auto).await;
    assert_eq!(result.method, DocMethod::RemoteInstruct);
    assert_eq!(result.description, "Adds two numbers.");
    assert!(result.note.is_none());
}

#[tokio::test]
async fn remote_error_degrades_to_local_instruct() {
    let remote = MockServer::start().await;
    mock_remote(&remote, ResponseTemplate::new(500)).await;

    let ollama = MockServer::start().await;
    mock_ollama_model(
        &ollama,
        "test-instruct",
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "response": "A small addition helper." })),
    )
    .await;

    let mut config = with_remote(base_config(), &remote, "CODE_NARRATOR_TEST_TOKEN_B");
    config.ollama.host = ollama.uri();
    let selector = DocSelector::new(&config);

    let result = selector.describe(CODE, DocHint::Auto).await;
    assert_eq!(result.method, DocMethod::LocalInstruct);
    assert_eq!(result.description, "A small addition helper.");
}

#[tokio::test]
async fn remote_timeout_is_abandoned_not_retried() {
    let remote = MockServer::start().await;
    mock_remote(
        &remote,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!([{ "generated_text": "too late" }]))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let mut config = with_remote(base_config(), &remote, "CODE_NARRATOR_TEST_TOKEN_C");
    config.remote.timeout_secs = 1;
    let selector = DocSelector::new(&config);

    let result = selector.describe(CODE, DocHint::Auto).await;
    assert_ne!(result.method, DocMethod::RemoteInstruct);
    // Local tiers are down too, so the chain lands on rules and says why.
    assert_eq!(result.method, DocMethod::RuleBased);
    let note = result.note.expect("degradation note");
    assert!(note.contains("remote-instruct"), "{note}");

    // One request only: the timed-out call is not retried.
    assert_eq!(remote.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_instruct_model_falls_through_to_base() {
    let ollama = MockServer::start().await;
    // Daemon is up, instruct model is not pulled.
    mock_ollama_model(&ollama, "test-instruct", ResponseTemplate::new(404)).await;
    mock_ollama_model(
        &ollama,
        "test-base",
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "response": "Defines an add function." })),
    )
    .await;

    let mut config = base_config();
    config.ollama.host = ollama.uri();
    let selector = DocSelector::new(&config);

    let result = selector.describe(CODE, DocHint::Auto).await;
    assert_eq!(result.method, DocMethod::LocalBase);
    assert_eq!(result.description, "Defines an add function.");
}

#[tokio::test]
async fn garbage_remote_payload_is_a_tier_failure() {
    let remote = MockServer::start().await;
    mock_remote(
        &remote,
        ResponseTemplate::new(200).set_body_string("not json at all"),
    )
    .await;

    let config = with_remote(base_config(), &remote, "CODE_NARRATOR_TEST_TOKEN_D");
    let selector = DocSelector::new(&config);

    let result = selector.describe(CODE, DocHint::Auto).await;
    assert_ne!(result.method, DocMethod::RemoteInstruct);
}

#[tokio::test]
async fn every_backend_failing_still_describes_the_code() {
    let remote = MockServer::start().await;
    mock_remote(&remote, ResponseTemplate::new(503)).await;

    let ollama = MockServer::start().await;
    mock_ollama_model(&ollama, "test-instruct", ResponseTemplate::new(500)).await;
    mock_ollama_model(&ollama, "test-base", ResponseTemplate::new(500)).await;

    let mut config = with_remote(base_config(), &remote, "CODE_NARRATOR_TEST_TOKEN_E");
    config.ollama.host = ollama.uri();
    let selector = DocSelector::new(&config);

    let result = selector.describe(CODE, DocHint::Auto).await;
    assert_eq!(result.method, DocMethod::RuleBased);
    assert!(result.description.contains("1 function"));
    let note = result.note.expect("degradation note");
    for tier in ["remote-instruct", "local-instruct", "local-base"] {
        assert!(note.contains(tier), "{note}");
    }
}

#[tokio::test]
async fn remote_tier_surfaces_through_the_http_boundary() {
    let remote = MockServer::start().await;
    mock_remote(
        &remote,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!([{ "generated_text": "Adds two numbers." }])),
    )
    .await;

    let config = with_remote(base_config(), &remote, "CODE_NARRATOR_TEST_TOKEN_F");
    let app = router(AppState {
        pipeline: Arc::new(Pipeline::new(&config)),
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/synthesize")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "code": CODE, "model_id": "tone-synthesis" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-doc-method"], "remote-instruct");
    assert_eq!(headers["x-tts-method"], "tone-synthesis");
    assert_eq!(
        headers["x-description"].to_str().unwrap(),
        "Adds two numbers."
    );
}
