//! `OpenAiClient` against a mock OpenAI-compatible upstream.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::StreamExt;
use hablemos::config::LlmConfig;
use hablemos::llm::openai::OpenAiClient;
use hablemos::llm::{ChatTurn, CompletionRequest, LlmClient};
use hablemos::AppError;
use serde_json::{json, Value};

/// Canned behaviour for the mock upstream.
#[derive(Clone, Copy)]
enum Mode {
    Reply,
    Empty,
    Fail,
}

#[derive(Clone)]
struct Upstream {
    mode: Mode,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

const STREAM_BODY: &str = concat!(
    ": keep-alive\n\n",
    "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"¡Hola\"},\"finish_reason\":null}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\", Ana!\"},\"finish_reason\":null}]}\n\n",
    "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
    "data: [DONE]\n\n",
);

async fn chat_completions(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let streaming = body["stream"].as_bool().unwrap_or(false);
    upstream.seen.lock().unwrap().push((auth, body));

    match upstream.mode {
        Mode::Fail => (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response(),
        Mode::Empty => Json(json!({"choices": [{"message": {"content": "  "}}]})).into_response(),
        Mode::Reply if streaming => (
            [("content-type", "text/event-stream")],
            STREAM_BODY,
        )
            .into_response(),
        Mode::Reply => Json(json!({
            "choices": [{"message": {"role": "assistant", "content": "¡Hola, Ana!"}}]
        }))
        .into_response(),
    }
}

async fn spawn_upstream(mode: Mode) -> (String, Upstream) {
    let upstream = Upstream {
        mode,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(upstream.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/v1/"), upstream)
}

fn client(base_url: String, api_key: Option<&str>) -> OpenAiClient {
    let config = LlmConfig {
        base_url,
        model: "test-model".into(),
        temperature: 0.5,
        max_tokens: 64,
        request_timeout_seconds: 5,
        history_limit: 10,
        api_key: api_key.map(str::to_owned),
    };
    OpenAiClient::new(&config).expect("client builds")
}

fn request(json: bool) -> CompletionRequest {
    CompletionRequest {
        system: Some("Eres un tutor.".into()),
        messages: vec![ChatTurn::user("Hola")],
        json,
        temperature: None,
    }
}

#[tokio::test]
async fn complete_returns_message_content() {
    let (base_url, upstream) = spawn_upstream(Mode::Reply).await;
    let client = client(base_url, Some("sk-test"));

    let text = client.complete(request(false)).await.expect("completion");
    assert_eq!(text, "¡Hola, Ana!");

    let seen = upstream.seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["stream"], false);
    assert_eq!(body["max_tokens"], 64);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "Hola");
    assert!(body.get("response_format").is_none());
}

#[tokio::test]
async fn json_requests_ask_for_json_object() {
    let (base_url, upstream) = spawn_upstream(Mode::Reply).await;
    let client = client(base_url, None);

    let mut req = request(true);
    req.temperature = Some(0.2);
    client.complete(req).await.expect("completion");

    let seen = upstream.seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert!(auth.is_none());
    assert_eq!(body["response_format"]["type"], "json_object");
    let temperature = body["temperature"].as_f64().expect("temperature");
    assert!((temperature - 0.2).abs() < 1e-6);
}

#[tokio::test]
async fn stream_yields_deltas_until_done() {
    let (base_url, upstream) = spawn_upstream(Mode::Reply).await;
    let client = client(base_url, None);

    let stream = client.stream(request(false)).await.expect("stream opens");
    let deltas: Vec<String> = stream
        .map(|item| item.expect("delta"))
        .collect()
        .await;
    assert_eq!(deltas, vec!["¡Hola", ", Ana!"]);

    let seen = upstream.seen.lock().unwrap();
    assert_eq!(seen[0].1["stream"], true);
}

#[tokio::test]
async fn upstream_error_status_is_llm_error() {
    let (base_url, _upstream) = spawn_upstream(Mode::Fail).await;
    let client = client(base_url, None);

    let result = client.complete(request(false)).await;
    assert!(
        matches!(result, Err(AppError::Llm(ref msg)) if msg.contains("429") && msg.contains("rate limited"))
    );

    let stream = client.stream(request(false)).await;
    assert!(matches!(stream, Err(AppError::Llm(_))));
}

#[tokio::test]
async fn blank_completion_is_llm_error() {
    let (base_url, _upstream) = spawn_upstream(Mode::Empty).await;
    let client = client(base_url, None);

    let result = client.complete(request(false)).await;
    assert!(matches!(result, Err(AppError::Llm(_))));
}

#[tokio::test]
async fn unreachable_upstream_is_llm_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = client(format!("http://{addr}/v1"), None);
    let result = client.complete(request(false)).await;
    assert!(matches!(result, Err(AppError::Llm(_))));
}
