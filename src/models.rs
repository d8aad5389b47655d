//! Data models for captured articles.
//!
//! The crawler produces exactly one kind of durable value: [`ArticleRecord`],
//! one CSV row per successfully captured article. Records are immutable once
//! built and are never updated or deleted after being appended to the record
//! file.

use serde::{Deserialize, Serialize};

/// A fully captured article, serialized as one row of the record file.
///
/// Field order matches the record file's column order:
/// `id,title,body,summary1,summary2,summary3`. All free-text fields have
/// already been normalized (no newlines, ASCII commas replaced with `、`)
/// by the extractor, so a row never needs escaping or quoting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Article identifier derived from the trailing path segment of the
    /// article link. Primary dedup key across runs.
    pub id: u64,
    /// Article headline.
    pub title: String,
    /// Full article body text.
    pub body: String,
    /// First line of the summary block.
    pub summary1: String,
    /// Second line of the summary block.
    pub summary2: String,
    /// Third line of the summary block.
    pub summary3: String,
}
