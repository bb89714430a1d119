use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{header::RETRY_AFTER, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::analysis::{analyze, free_text_prompt};
use crate::app::state::AppState;
use crate::error::AnalysisError;
use crate::models::{AnalyticsRequest, AnalyticsResponse, Item, PromptRequest, PromptResponse};
use crate::TARGET_WEB_REQUEST;

pub const SERVICE_NAME: &str = "ai-analytics";

/// Failed news analysis; the body is still an analysis envelope.
struct AnalysisFailure(AnalysisError);

/// Failed free-text prompt, reported as `{"detail": ...}`.
struct PromptFailure(AnalysisError);

fn with_retry_after(mut response: Response, err: &AnalysisError) -> Response {
    if let Some(secs) = err.retry_after() {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}

impl IntoResponse for AnalysisFailure {
    fn into_response(self) -> Response {
        let body = AnalyticsResponse::new(self.0.to_string(), Vec::new());
        let response = (self.0.status_code(), Json(body)).into_response();
        with_retry_after(response, &self.0)
    }
}

impl IntoResponse for PromptFailure {
    fn into_response(self) -> Response {
        let body = json!({ "detail": self.0.detail() });
        let response = (self.0.status_code(), Json(body)).into_response();
        with_retry_after(response, &self.0)
    }
}

/// Builds the full router: news analysis, free-text prompts and the small utility routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/ai/analyze-news", post(analyze_news))
        .route("/analytics/", post(analytics))
        .route("/analytics", post(analytics))
        .route("/items/", post(create_item))
        .route("/items", post(create_item))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds the listener and serves until Ctrl-C.
pub async fn app_api_loop(host: &str, port: u16, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(target: TARGET_WEB_REQUEST, "Server running on http://{}", addr);

    axum::serve(listener, create_router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    info!(target: TARGET_WEB_REQUEST, "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_err() {
        error!("Failed to listen for ctrl-c");
    }
    info!("Ctrl-C received, shutting down.");
}

async fn root() -> Json<Value> {
    Json(json!({ "message": format!("Hello from {}!", SERVICE_NAME) }))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn create_item(Json(item): Json<Item>) -> Json<Value> {
    info!(target: TARGET_WEB_REQUEST, "Received item {}", item.id);
    Json(json!({ "received": item }))
}

/// Analyzes news articles with the requested template.
async fn analyze_news(
    State(state): State<AppState>,
    Json(request): Json<AnalyticsRequest>,
) -> Result<Json<AnalyticsResponse>, AnalysisFailure> {
    info!(
        target: TARGET_WEB_REQUEST,
        "analyze-news request: {} item(s), type {:?}",
        request.news.len(),
        request.analysis_type
    );

    analyze(state.generator(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(target: TARGET_WEB_REQUEST, "analyze-news failed ({}): {}", e.status_code(), e);
            AnalysisFailure(e)
        })
}

async fn analytics(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<PromptResponse>, PromptFailure> {
    info!(target: TARGET_WEB_REQUEST, "analytics prompt request ({} chars)", request.prompt.chars().count());

    free_text_prompt(state.generator(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(target: TARGET_WEB_REQUEST, "analytics prompt failed ({}): {}", e.status_code(), e);
            PromptFailure(e)
        })
}
