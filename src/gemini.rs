use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::LlmError;
use crate::TARGET_LLM_REQUEST;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Longest slice of an unexpected provider body echoed back in errors.
const MAX_ERROR_SNIPPET: usize = 200;

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// The response shapes Gemini is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiReply {
    Error {
        error: ApiErrorBody,
    },
    Candidates {
        candidates: Vec<Candidate>,
        #[serde(rename = "promptFeedback")]
        prompt_feedback: Option<PromptFeedback>,
    },
    PromptBlocked {
        #[serde(rename = "promptFeedback")]
        prompt_feedback: PromptFeedback,
    },
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiReply {
    /// Extracts the generated text from the first candidate.
    fn into_text(self) -> Result<String, LlmError> {
        match self {
            GeminiReply::Error { error } => Err(LlmError::Provider(match error.status {
                Some(status) => format!("{}: {}", status, error.message),
                None => error.message,
            })),
            GeminiReply::Candidates {
                candidates,
                prompt_feedback,
            } => {
                let Some(candidate) = candidates.into_iter().next() else {
                    return Err(blocked_or_unrecognized(prompt_feedback));
                };
                let text: String = candidate
                    .content
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .filter_map(|part| part.text)
                            .collect()
                    })
                    .unwrap_or_default();
                if !text.is_empty() {
                    return Ok(text);
                }
                match candidate.finish_reason.as_deref() {
                    Some("STOP") | Some("MAX_TOKENS") | None => Err(LlmError::UnrecognizedResponse(
                        "candidate contained no text".to_string(),
                    )),
                    Some(reason) => Err(LlmError::Blocked(reason.to_string())),
                }
            }
            GeminiReply::PromptBlocked { prompt_feedback } => {
                Err(blocked_or_unrecognized(Some(prompt_feedback)))
            }
        }
    }
}

fn blocked_or_unrecognized(feedback: Option<PromptFeedback>) -> LlmError {
    match feedback.and_then(|f| f.block_reason) {
        Some(reason) => LlmError::Blocked(reason),
        None => LlmError::UnrecognizedResponse("response contained no candidates".to_string()),
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(MAX_ERROR_SNIPPET).collect()
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sends a single prompt and returns the generated text.
    pub async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(target: TARGET_LLM_REQUEST, "Gemini {} responded with status {}", model, status);

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

        if !status.is_success() {
            let message = match serde_json::from_str::<GeminiReply>(&text) {
                Ok(GeminiReply::Error { error }) => error.message,
                _ => snippet(&text),
            };
            return Err(LlmError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<GeminiReply>(&text)
            .map_err(|_| LlmError::UnrecognizedResponse(snippet(&text)))?
            .into_text()
    }
}
