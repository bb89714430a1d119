use ai_analytics::app::{app_api_loop, AppState};
use ai_analytics::environment::AppConfig;
use ai_analytics::llm::{LlmService, TextGenerator};
use ai_analytics::logging::configure_logging;
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[clap(
    name = "ai-analytics",
    about = "Analyze news articles with a generative language model"
)]
struct Args {
    /// Address to bind (overrides HOST)
    #[clap(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[clap(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    configure_logging();

    let config = AppConfig::from_env()?;
    let host = args.host.unwrap_or_else(|| config.host.clone());
    let port = args.port.unwrap_or(config.port);

    info!("Using language model provider: {}", config.provider.describe());
    info!(
        "Provider calls limited to {} concurrent, {}s timeout, {} retries",
        config.limits.max_concurrency,
        config.limits.timeout.as_secs(),
        config.limits.max_retries
    );

    let generator: Option<Arc<dyn TextGenerator>> = match config.llm_params() {
        Some(params) => Some(Arc::new(LlmService::new(params, config.limits.clone()))),
        None => {
            warn!("LLM_PROVIDER=none: prompts will be echoed and news analysis is unavailable");
            None
        }
    };

    app_api_loop(&host, port, AppState::new(generator)).await
}
