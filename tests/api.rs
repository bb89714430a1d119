//! Router tests: real axum `Router`, requests sent with `tower::ServiceExt::oneshot`
//! and a scripted generator standing in for the provider.

use ai_analytics::app::{create_router, AppState};
use ai_analytics::error::LlmError;
use ai_analytics::llm::TextGenerator;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct ScriptedGenerator {
    reply: Result<String, LlmError>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn new(reply: Result<String, LlmError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn router_with(generator: &Arc<ScriptedGenerator>) -> Router {
    let generator: Arc<dyn TextGenerator> = generator.clone();
    create_router(AppState::new(Some(generator)))
}

async fn send(
    router: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, retry_after, json)
}

fn news_request(analysis_type: &str) -> Value {
    json!({
        "news": [{"id": 1, "title": "A", "content": "short", "publication_date": "2024-01-01"}],
        "analysis_type": analysis_type
    })
}

#[tokio::test]
async fn health_reports_service() {
    let router = create_router(AppState::default());
    let (status, _, json) = send(router, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "healthy", "service": "ai-analytics"}));
}

#[tokio::test]
async fn root_greets() {
    let router = create_router(AppState::default());
    let (status, _, json) = send(router, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("ai-analytics"));
}

#[tokio::test]
async fn items_are_echoed() {
    let router = create_router(AppState::default());
    let (status, _, json) = send(
        router,
        Method::POST,
        "/items/",
        Some(json!({"id": 7, "name": "widget"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"received": {"id": 7, "name": "widget"}}));
}

#[tokio::test]
async fn analyze_news_returns_envelope() {
    let generator = ScriptedGenerator::new(Ok("Line one.\n\nLine two.".to_string()));
    let (status, _, json) = send(
        router_with(&generator),
        Method::POST,
        "/api/ai/analyze-news",
        Some(news_request("summary")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["analysis"], "Line one.\n\nLine two.");
    assert_eq!(json["insights"], json!(["Line one.", "Line two."]));
    assert!(json["generated_at"].as_str().unwrap().ends_with('Z'));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn analyze_news_defaults_to_summary() {
    let generator = ScriptedGenerator::new(Ok("ok".to_string()));
    let (status, _, _) = send(
        router_with(&generator),
        Method::POST,
        "/api/ai/analyze-news",
        Some(json!({"news": [{"id": 1, "title": "A", "content": "c", "publication_date": "d"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_news_is_not_an_error() {
    let generator = ScriptedGenerator::new(Ok("unused".to_string()));
    let (status, _, json) = send(
        router_with(&generator),
        Method::POST,
        "/api/ai/analyze-news",
        Some(json!({"news": [], "analysis_type": "topics"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["analysis"], "No news items provided");
    assert_eq!(json["insights"], json!([]));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_analysis_type_is_bad_request() {
    let generator = ScriptedGenerator::new(Ok("unused".to_string()));
    let (status, retry_after, json) = send(
        router_with(&generator),
        Method::POST,
        "/api/ai/analyze-news",
        Some(news_request("poetry")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(retry_after.is_none());
    assert_eq!(json["analysis"], "Invalid analysis type");
    assert_eq!(json["insights"], json!([]));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn provider_failure_keeps_envelope() {
    let generator = ScriptedGenerator::new(Err(LlmError::Http {
        status: 500,
        message: "internal".to_string(),
    }));
    let (status, retry_after, json) = send(
        router_with(&generator),
        Method::POST,
        "/api/ai/analyze-news",
        Some(news_request("sentiment")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(retry_after.as_deref(), Some("5"));
    let analysis = json["analysis"].as_str().unwrap();
    assert!(analysis.starts_with("Error generating analysis: "));
    assert!(analysis.contains("internal"));
    assert_eq!(json["insights"], json!([]));
}

#[tokio::test]
async fn provider_timeout_is_gateway_timeout() {
    let generator = ScriptedGenerator::new(Err(LlmError::Timeout(Duration::from_secs(60))));
    let (status, retry_after, _) = send(
        router_with(&generator),
        Method::POST,
        "/api/ai/analyze-news",
        Some(news_request("trends")),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(retry_after.is_some());
}

#[tokio::test]
async fn analysis_without_model_is_unavailable() {
    let router = create_router(AppState::default());
    let (status, _, json) = send(
        router,
        Method::POST,
        "/api/ai/analyze-news",
        Some(news_request("summary")),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["analysis"]
        .as_str()
        .unwrap()
        .contains("no language model configured"));
}

#[tokio::test]
async fn free_text_prompt_returns_text() {
    let generator = ScriptedGenerator::new(Ok("generated".to_string()));
    let (status, _, json) = send(
        router_with(&generator),
        Method::POST,
        "/analytics/",
        Some(json!({"prompt": "Summarize the week"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"text": "generated"}));
}

#[tokio::test]
async fn free_text_prompt_echoes_without_model() {
    let router = create_router(AppState::default());
    let (status, _, json) = send(
        router,
        Method::POST,
        "/analytics",
        Some(json!({"prompt": "ping"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"text": "Received prompt (no model configured): ping"})
    );
}

#[tokio::test]
async fn free_text_failure_uses_same_status_mapping() {
    let generator = ScriptedGenerator::new(Err(LlmError::RateLimited {
        retry_after: Some(9),
    }));
    let (status, retry_after, json) = send(
        router_with(&generator),
        Method::POST,
        "/analytics/",
        Some(json!({"prompt": "anything"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(retry_after.as_deref(), Some("9"));
    assert_eq!(json, json!({"detail": "provider rate limit exceeded"}));
}

#[tokio::test]
async fn blank_prompt_is_bad_request() {
    let generator = ScriptedGenerator::new(Ok("unused".to_string()));
    let (status, _, json) = send(
        router_with(&generator),
        Method::POST,
        "/analytics/",
        Some(json!({"prompt": ""})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"detail": "Prompt is required"}));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}
