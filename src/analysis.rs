use tracing::{debug, info, warn};

use crate::error::{AnalysisError, LlmError};
use crate::llm::TextGenerator;
use crate::models::{AnalysisType, AnalyticsRequest, AnalyticsResponse, PromptRequest, PromptResponse};
use crate::prompt::news_analysis_prompt;

pub const NO_NEWS_ITEMS: &str = "No news items provided";

/// Maximum number of insight lines returned with an analysis.
pub const MAX_INSIGHTS: usize = 5;

/// Picks the first non-empty, trimmed lines of a model response.
pub fn extract_insights(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_INSIGHTS)
        .map(String::from)
        .collect()
}

/// Analyzes a batch of news articles with the template selected by `analysis_type`.
///
/// An empty batch is answered without touching the provider, as is an
/// unrecognized analysis type (reported as an error). `generator` is `None`
/// when the process runs without a configured model.
pub async fn analyze(
    generator: Option<&dyn TextGenerator>,
    request: &AnalyticsRequest,
) -> Result<AnalyticsResponse, AnalysisError> {
    if request.news.is_empty() {
        info!("Analysis requested with no news items");
        return Ok(AnalyticsResponse::new(NO_NEWS_ITEMS, Vec::new()));
    }

    let analysis_type: AnalysisType = request.analysis_type.parse().map_err(|e| {
        warn!("Rejecting unknown analysis type: {:?}", request.analysis_type);
        e
    })?;

    let prompt = news_analysis_prompt(analysis_type, &request.news);
    info!(
        "Running {} analysis over {} news item(s)",
        analysis_type,
        request.news.len()
    );

    let generator = generator.ok_or(LlmError::NotConfigured)?;
    let analysis = generator.generate(&prompt).await?;
    let insights = extract_insights(&analysis);
    debug!("{} analysis produced {} insight(s)", analysis_type, insights.len());

    Ok(AnalyticsResponse::new(analysis, insights))
}

/// Forwards a caller-supplied prompt to the provider unmodified.
///
/// Without a configured model the prompt is echoed back instead.
pub async fn free_text_prompt(
    generator: Option<&dyn TextGenerator>,
    request: &PromptRequest,
) -> Result<PromptResponse, AnalysisError> {
    if request.prompt.trim().is_empty() {
        return Err(AnalysisError::EmptyPrompt);
    }

    let Some(generator) = generator else {
        info!("No model configured, echoing prompt");
        return Ok(PromptResponse {
            text: format!("Received prompt (no model configured): {}", request.prompt),
        });
    };

    let text = generator.generate(&request.prompt).await?;
    Ok(PromptResponse { text })
}
