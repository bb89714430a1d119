use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// A single news article submitted for analysis.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub publication_date: String,
}

/// Request body for `POST /api/ai/analyze-news`.
///
/// `analysis_type` stays a plain string on the wire so an unknown value is
/// reported by the gateway instead of being rejected by the JSON extractor.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AnalyticsRequest {
    pub news: Vec<NewsItem>,
    #[serde(default = "default_analysis_type")]
    pub analysis_type: String,
}

fn default_analysis_type() -> String {
    AnalysisType::Summary.as_str().to_string()
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AnalyticsResponse {
    pub analysis: String,
    pub insights: Vec<String>,
    pub generated_at: String,
}

impl AnalyticsResponse {
    /// Builds an envelope stamped with the current UTC time.
    pub fn new(analysis: impl Into<String>, insights: Vec<String>) -> Self {
        Self {
            analysis: analysis.into(),
            insights,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Selects the prompt template used for a news analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisType {
    Summary,
    Sentiment,
    Trends,
    Topics,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 4] = [
        AnalysisType::Summary,
        AnalysisType::Sentiment,
        AnalysisType::Trends,
        AnalysisType::Topics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Summary => "summary",
            AnalysisType::Sentiment => "sentiment",
            AnalysisType::Trends => "trends",
            AnalysisType::Topics => "topics",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = AnalysisError;

    // Matching is exact: "Summary" is not a recognized type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AnalysisError::InvalidAnalysisType(s.to_string()))
    }
}

/// Request body for the free-text `POST /analytics/` endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PromptResponse {
    pub text: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub name: String,
}
