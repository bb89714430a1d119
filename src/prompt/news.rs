use crate::models::{AnalysisType, NewsItem};
use crate::prompt::common::format_news_items;

/// Shared layout: instructions, the rendered articles, then the label the model continues from.
fn news_prompt(instructions: &str, items: &[NewsItem], label: &str) -> String {
    format!(
        r#"{instructions}

News Articles:
{articles}

{label}"#,
        instructions = instructions,
        articles = format_news_items(items),
        label = label
    )
}

/// Generate a prompt for a concise summary of a set of articles
pub fn summary_prompt(items: &[NewsItem]) -> String {
    news_prompt(
        "Analyze the following news articles and provide a concise summary.\n\
         Focus on the main topics, key events, and important details.",
        items,
        "Summary:",
    )
}

/// Generate a prompt for per-article sentiment with brief reasoning
pub fn sentiment_prompt(items: &[NewsItem]) -> String {
    news_prompt(
        "Analyze the sentiment of the following news articles.\n\
         For each article, provide sentiment (positive, negative, neutral) and brief reasoning.",
        items,
        "Sentiment Analysis:",
    )
}

/// Generate a prompt for trends and patterns across articles
pub fn trends_prompt(items: &[NewsItem]) -> String {
    news_prompt(
        "Identify key trends and patterns across these news articles.\n\
         Look for common themes, recurring topics, and significant events.",
        items,
        "Identified Trends:",
    )
}

/// Generate a prompt for grouping articles into prominent topics
pub fn topics_prompt(items: &[NewsItem]) -> String {
    news_prompt(
        "Extract and categorize the main topics from these news articles.\n\
         Group related articles and identify the most prominent topics.",
        items,
        "Topic Analysis:",
    )
}

pub fn news_analysis_prompt(analysis_type: AnalysisType, items: &[NewsItem]) -> String {
    match analysis_type {
        AnalysisType::Summary => summary_prompt(items),
        AnalysisType::Sentiment => sentiment_prompt(items),
        AnalysisType::Trends => trends_prompt(items),
        AnalysisType::Topics => topics_prompt(items),
    }
}
