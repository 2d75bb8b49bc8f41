//! Gemini round trips against a local mock server.

use ai_client::Gemini;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, JsonSchema)]
struct Verdict {
    label: String,
    score: u8,
}

fn candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn extract_parses_structured_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "k"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json", "maxOutputTokens": 4096}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(candidate(r#"{"label":"true","score":91}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ai = Gemini::new("k", "gemini-test").with_base_url(server.uri());
    let verdict: Verdict = ai.extract("judge", "the sky is blue").await.unwrap();

    assert_eq!(verdict.label, "true");
    assert_eq!(verdict.score, 91);
}

#[tokio::test]
async fn extract_tolerates_fenced_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(
            "```json\n{\"label\":\"false\",\"score\":12}\n```",
        )))
        .mount(&server)
        .await;

    let ai = Gemini::new("k", "gemini-test").with_base_url(server.uri());
    let verdict: Verdict = ai.extract("judge", "claim").await.unwrap();
    assert_eq!(verdict.label, "false");
}

#[tokio::test]
async fn api_errors_surface_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exhausted"))
        .mount(&server)
        .await;

    let ai = Gemini::new("k", "gemini-test").with_base_url(server.uri());
    let err = ai.extract::<Verdict>("judge", "hi").await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("429"), "{text}");
    assert!(text.contains("quota exhausted"), "{text}");
}

#[tokio::test]
async fn blocked_prompt_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
        )
        .mount(&server)
        .await;

    let ai = Gemini::new("k", "gemini-test").with_base_url(server.uri());
    let err = ai.extract::<Verdict>("judge", "hi").await.unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
}
