use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STDOUT_FILTER: &str = "info,llm_request=info,web_request=info,tower_http=info";
const FILE_FILTER: &str = "info,llm_request=debug,web_request=debug,tower_http=debug";

pub fn configure_logging() {
    // Connection-level chatter from the HTTP stack is never useful here
    let custom_filter = FilterFn::new(|metadata| {
        let noisy = metadata.target().starts_with("hyper") || metadata.target().starts_with("h2");
        !(noisy && (*metadata.level() == Level::DEBUG || *metadata.level() == Level::TRACE))
    });

    // RUST_LOG overrides the stdout defaults
    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(STDOUT_FILTER)))
        .with_filter(custom_filter);

    // Prompts and raw responses only go to the file log
    let file_appender = rolling::daily("logs", "ai-analytics.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}
