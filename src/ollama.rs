use ollama_rs::generation::options::GenerationOptions;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::TARGET_LLM_REQUEST;

const MAX_ERROR_SNIPPET: usize = 200;

/// Client for Ollama's non-streaming `/api/generate` endpoint.
///
/// Talks HTTP directly so that status codes survive into [`LlmError`].
#[derive(Clone, Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OllamaReply {
    Error { error: String },
    Generated { response: String },
}

fn snippet(body: &str) -> String {
    body.chars().take(MAX_ERROR_SNIPPET).collect()
}

impl OllamaClient {
    /// `host` carries the scheme, e.g. `http://localhost`.
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_base_url(format!("{}:{}", host.trim_end_matches('/'), port))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerationOptions::default().temperature(temperature),
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(target: TARGET_LLM_REQUEST, "Ollama {} responded with status {}", model, status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(LlmError::RateLimited { retry_after });
        }

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        match serde_json::from_str::<OllamaReply>(&text) {
            Ok(OllamaReply::Generated { response }) if status.is_success() => Ok(response),
            Ok(OllamaReply::Error { error }) if !status.is_success() => Err(LlmError::Http {
                status: status.as_u16(),
                message: error,
            }),
            Ok(OllamaReply::Error { error }) => Err(LlmError::Provider(error)),
            _ if !status.is_success() => Err(LlmError::Http {
                status: status.as_u16(),
                message: snippet(&text),
            }),
            _ => Err(LlmError::UnrecognizedResponse(snippet(&text))),
        }
    }
}
