use async_openai::error::OpenAIError;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::error::LlmError;
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Bounds placed around every provider call.
#[derive(Clone, Debug)]
pub struct LlmLimits {
    pub timeout: Duration,
    pub max_concurrency: usize,
    pub max_retries: u32,
}

impl Default for LlmLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_concurrency: 8,
            max_retries: 0,
        }
    }
}

/// A configured provider plus the gate and timeout that guard it.
pub struct LlmService {
    params: LLMParams,
    gate: Arc<Semaphore>,
    limits: LlmLimits,
}

impl LlmService {
    pub fn new(params: LLMParams, limits: LlmLimits) -> Self {
        let gate = Arc::new(Semaphore::new(limits.max_concurrency.max(1)));
        Self {
            params,
            gate,
            limits,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        generate_llm_response(prompt, self).await
    }
}

/// First wait between attempts; doubled after every retry.
const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Runs one prompt through the provider, retrying only transient failures.
pub async fn generate_llm_response(prompt: &str, service: &LlmService) -> Result<String, LlmError> {
    let provider = service.params.llm_client.provider_name();

    debug!(target: TARGET_LLM_REQUEST, "Starting {} request with model {} for prompt: {}", provider, service.params.model, prompt);

    let response_text =
        retry_transient(&service.limits, provider, || attempt_once(prompt, service)).await?;
    debug!(target: TARGET_LLM_REQUEST, "{} response received: {}", provider, response_text);
    Ok(response_text)
}

async fn retry_transient<F, Fut>(
    limits: &LlmLimits,
    provider: &str,
    mut call: F,
) -> Result<String, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, LlmError>>,
{
    let max_attempts = limits.max_retries.saturating_add(1);
    let mut backoff = INITIAL_BACKOFF;

    let mut attempt = 1;
    loop {
        match call().await {
            Ok(response_text) => return Ok(response_text),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(target: TARGET_LLM_REQUEST, "{} request failed: {}", provider, e);
                info!(target: TARGET_LLM_REQUEST, "Retrying {} request... ({}/{})", provider, attempt, limits.max_retries);
                let wait = retry_wait(&e, backoff, limits.timeout);
                debug!(target: TARGET_LLM_REQUEST, "Backing off for {:?} before retry", wait);
                sleep(wait).await;
                backoff = backoff.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => {
                error!(target: TARGET_LLM_REQUEST, "{} request failed after {} attempt(s): {}", provider, attempt, e);
                return Err(e);
            }
        }
    }
}

/// Honors a provider's Retry-After, but never waits longer than one call may take.
fn retry_wait(err: &LlmError, backoff: Duration, cap: Duration) -> Duration {
    let wait = match err {
        LlmError::RateLimited {
            retry_after: Some(secs),
        } => Duration::from_secs(*secs).max(backoff),
        _ => backoff,
    };
    wait.min(cap)
}

/// One gated, time-limited provider call.
async fn attempt_once(prompt: &str, service: &LlmService) -> Result<String, LlmError> {
    let limit = service.limits.timeout;

    let _permit = match timeout(limit, service.gate.acquire()).await {
        Ok(Ok(permit)) => permit,
        _ => {
            warn!(target: TARGET_LLM_REQUEST, "No provider slot freed up within {:?}", limit);
            return Err(LlmError::Saturated);
        }
    };

    match timeout(limit, dispatch(prompt, &service.params)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(target: TARGET_LLM_REQUEST, "{} request timed out", service.params.llm_client.provider_name());
            Err(LlmError::Timeout(limit))
        }
    }
}

async fn dispatch(prompt: &str, params: &LLMParams) -> Result<String, LlmError> {
    match &params.llm_client {
        LLMClient::Gemini(client) => {
            client
                .generate_content(&params.model, prompt, params.temperature)
                .await
        }
        LLMClient::Ollama(client) => {
            client
                .generate(&params.model, prompt, params.temperature)
                .await
        }
        LLMClient::OpenAI(client) => {
            let message = ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(openai_error)?;
            let request = CreateChatCompletionRequestArgs::default()
                .model(params.model.as_str())
                .temperature(params.temperature)
                .messages([message.into()])
                .build()
                .map_err(openai_error)?;
            let response = client.chat().create(request).await.map_err(openai_error)?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| {
                    LlmError::UnrecognizedResponse("completion contained no message content".to_string())
                })
        }
    }
}

/// Sorts async-openai failures into the shared taxonomy.
///
/// async-openai already retries 429s (other than `insufficient_quota`) and 5xx
/// internally; whatever reaches here has either exhausted that or is permanent.
/// The outer `timeout` in `attempt_once` still bounds the whole call.
fn openai_error(err: OpenAIError) -> LlmError {
    match err {
        OpenAIError::Reqwest(e) => LlmError::Transport(e.to_string()),
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.as_deref().or(api.code.as_deref());
            match kind {
                Some("rate_limit_exceeded") | Some("insufficient_quota") => {
                    LlmError::RateLimited { retry_after: None }
                }
                // 5xx bodies are passed through as a bare message.
                None if api.param.is_none() => LlmError::Http {
                    status: 500,
                    message: api.message,
                },
                _ => LlmError::Provider(api.message),
            }
        }
        OpenAIError::JSONDeserialize(e) => LlmError::UnrecognizedResponse(e.to_string()),
        other => LlmError::Provider(other.to_string()),
    }
}
