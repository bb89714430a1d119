mod common;
mod news;

pub use common::{format_news_item, format_news_items, truncate_content, MAX_CONTENT_CHARS};
pub use news::{
    news_analysis_prompt, sentiment_prompt, summary_prompt, topics_prompt, trends_prompt,
};
