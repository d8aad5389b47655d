//! Text normalization and record assembly.
//!
//! The extractor is pure: given the raw title, summary block, and body text
//! read from an article's pages, it produces an [`ArticleRecord`] for an
//! already-known identifier. All free-text fields pass through
//! [`normalize`], which keeps them safe inside a comma-delimited row
//! without escaping or quoting.

use crate::models::ArticleRecord;
use tracing::warn;

/// Normalize a free-text field for the record file.
///
/// Removes every newline character and replaces every ASCII comma with the
/// full-width ideographic comma `、`. All other characters are preserved
/// verbatim.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize("a,b\nc"), "a、bc");
/// ```
pub fn normalize(text: &str) -> String {
    text.replace('\n', "").replace(',', "、")
}

/// Build an [`ArticleRecord`] from raw extracted text.
///
/// The summary block is split into lines **before** normalization (which
/// would otherwise destroy the line structure); the record captures exactly
/// the first three resulting lines positionally. A summary block with fewer
/// than three lines pads the missing positions with empty strings rather
/// than failing the article.
///
/// # Arguments
///
/// * `id` - The article identifier derived from the entry link
/// * `title` - Raw title text
/// * `summary_block` - Raw summary text, one summary per line
/// * `body` - Raw body text
pub fn build_record(id: u64, title: &str, summary_block: &str, body: &str) -> ArticleRecord {
    let lines: Vec<&str> = summary_block.split('\n').collect();
    if lines.len() < 3 {
        warn!(
            id,
            lines = lines.len(),
            "Summary block has fewer than three lines; padding with empty fields"
        );
    }
    let summary = |i: usize| normalize(lines.get(i).copied().unwrap_or(""));

    ArticleRecord {
        id,
        title: normalize(title),
        body: normalize(body),
        summary1: summary(0),
        summary2: summary(1),
        summary3: summary(2),
    }
}
