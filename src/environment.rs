use anyhow::{anyhow, bail, Context, Result};
use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::gemini::{self, GeminiClient};
use crate::llm::LlmLimits;
use crate::ollama::OllamaClient;
use crate::{LLMClient, LLMParams};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
const DEFAULT_OLLAMA_HOST: &str = "http://localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Upper bound for `LLM_MAX_RETRIES`.
pub const MAX_RETRIES_LIMIT: u32 = 10;
/// Upper bound for `LLM_TEMPERATURE`; every supported provider accepts 0.0..=2.0.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Which provider backs the service, with the settings it needs.
///
/// Holds credentials, so it deliberately has no `Debug` impl.
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        model: String,
        base_url: String,
    },
    Ollama {
        host: String,
        port: u16,
        model: String,
    },
    OpenAI {
        api_key: String,
        model: String,
    },
    /// Explicitly disabled: free-text prompts are echoed back.
    None,
}

impl ProviderConfig {
    /// Provider and model, safe to log.
    pub fn describe(&self) -> String {
        match self {
            ProviderConfig::Gemini { model, .. } => format!("gemini ({})", model),
            ProviderConfig::Ollama {
                host, port, model, ..
            } => format!("ollama ({} at {}:{})", model, host, port),
            ProviderConfig::OpenAI { model, .. } => format!("openai ({})", model),
            ProviderConfig::None => "none".to_string(),
        }
    }
}

/// Process configuration, read once at startup.
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub provider: ProviderConfig,
    pub temperature: f32,
    pub limits: LlmLimits,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = match get("LLM_PROVIDER")
            .unwrap_or_else(|| "gemini".to_string())
            .to_lowercase()
            .as_str()
        {
            "gemini" => ProviderConfig::Gemini {
                api_key: get("GEMINI_API_KEY")
                    .ok_or_else(|| anyhow!("GEMINI_API_KEY environment variable not set"))?,
                model: get("GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
                base_url: get("GEMINI_BASE_URL")
                    .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
            },
            "ollama" => {
                let host = get("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
                reqwest::Url::parse(&host)
                    .with_context(|| format!("OLLAMA_HOST is not a valid URL: {}", host))?;
                ProviderConfig::Ollama {
                    host,
                    port: parse_var(&get, "OLLAMA_PORT", DEFAULT_OLLAMA_PORT)?,
                    model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                }
            }
            "openai" => ProviderConfig::OpenAI {
                api_key: get("OPENAI_API_KEY")
                    .ok_or_else(|| anyhow!("OPENAI_API_KEY environment variable not set"))?,
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
            "none" => ProviderConfig::None,
            other => bail!(
                "Unknown LLM_PROVIDER '{}': expected gemini, ollama, openai or none",
                other
            ),
        };

        let defaults = LlmLimits::default();
        let limits = LlmLimits {
            timeout: Duration::from_secs(parse_var(
                &get,
                "LLM_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            max_concurrency: parse_var(&get, "LLM_MAX_CONCURRENCY", defaults.max_concurrency)?,
            max_retries: parse_var(&get, "LLM_MAX_RETRIES", defaults.max_retries)?,
        };
        if limits.timeout.is_zero() {
            bail!("LLM_TIMEOUT_SECS must be greater than zero");
        }
        if limits.max_concurrency == 0 {
            bail!("LLM_MAX_CONCURRENCY must be greater than zero");
        }
        if limits.max_retries > MAX_RETRIES_LIMIT {
            bail!(
                "LLM_MAX_RETRIES must be at most {}, got {}",
                MAX_RETRIES_LIMIT,
                limits.max_retries
            );
        }

        let temperature: f32 = parse_var(&get, "LLM_TEMPERATURE", 0.0)?;
        if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
            bail!(
                "LLM_TEMPERATURE must be between 0.0 and {}, got {}",
                MAX_TEMPERATURE,
                temperature
            );
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_var(&get, "PORT", DEFAULT_PORT)?,
            provider,
            temperature,
            limits,
        })
    }

    /// Builds the provider client, or `None` when the provider is disabled.
    pub fn llm_params(&self) -> Option<LLMParams> {
        let (llm_client, model) = match &self.provider {
            ProviderConfig::Gemini {
                api_key,
                model,
                base_url,
            } => (
                LLMClient::Gemini(GeminiClient::new(api_key.clone()).with_base_url(base_url.clone())),
                model.clone(),
            ),
            ProviderConfig::Ollama { host, port, model } => {
                (LLMClient::Ollama(OllamaClient::new(host, *port)), model.clone())
            }
            ProviderConfig::OpenAI { api_key, model } => {
                let config = OpenAIConfig::new().with_api_key(api_key.clone());
                (
                    LLMClient::OpenAI(OpenAIClient::with_config(config)),
                    model.clone(),
                )
            }
            ProviderConfig::None => return None,
        };

        Some(LLMParams {
            llm_client,
            model,
            temperature: self.temperature,
        })
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid value for {}: {}", key, value)),
        None => Ok(default),
    }
}
