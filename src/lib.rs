pub mod analysis;
pub mod app;
pub mod environment;
pub mod error;
pub mod gemini;
pub mod llm;
pub mod logging;
pub mod models;
pub mod ollama;
pub mod prompt;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use crate::gemini::GeminiClient;
use crate::ollama::OllamaClient;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Gemini(GeminiClient),
    Ollama(OllamaClient),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

impl LLMClient {
    /// Short provider name used in logs.
    pub fn provider_name(&self) -> &'static str {
        match self {
            LLMClient::Gemini(_) => "gemini",
            LLMClient::Ollama(_) => "ollama",
            LLMClient::OpenAI(_) => "openai",
        }
    }
}

#[derive(Clone, Debug)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
}
