use crate::models::NewsItem;

/// Number of content characters kept per article when building a prompt.
pub const MAX_CONTENT_CHARS: usize = 500;

/// Returns at most the first `MAX_CONTENT_CHARS` characters of `content`.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate_content(content: &str) -> &str {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Renders one article as it appears in every news prompt.
///
/// The trailing "..." is always appended, truncated or not.
pub fn format_news_item(item: &NewsItem) -> String {
    format!(
        "Title: {}\nContent: {}...",
        item.title,
        truncate_content(&item.content)
    )
}

/// Renders all articles in input order, one per line block.
pub fn format_news_items(items: &[NewsItem]) -> String {
    items
        .iter()
        .map(format_news_item)
        .collect::<Vec<_>>()
        .join("\n")
}
