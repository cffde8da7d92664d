//! Turns raw backend replies into article records.
//!
//! Backends asked for JSON still wrap it in Markdown fences or chat around
//! it, so decoding works through progressively looser views of the text.

use gaia_core::{ArticleRecord, Error, Result};
use serde_json::{Map, Value};

/// Parses a structured reply, yielding an empty list when nothing usable is
/// found.
pub fn parse_articles(raw: &str) -> Vec<ArticleRecord> {
    match try_parse_articles(raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("⚠️ {}", e);
            Vec::new()
        }
    }
}

/// Like [`parse_articles`] but reports why nothing could be decoded.
pub fn try_parse_articles(raw: &str) -> Result<Vec<ArticleRecord>> {
    let trimmed = raw.trim();
    let fenced = strip_fence(trimmed);

    let candidates = [Some(trimmed), Some(fenced), bracketed(fenced), bracketed(trimmed)];
    let value = candidates
        .into_iter()
        .flatten()
        .find_map(|text| serde_json::from_str::<Value>(text).ok())
        .ok_or_else(|| {
            Error::Parse(format!(
                "Could not decode a JSON article list from {} bytes of output",
                raw.len()
            ))
        })?;

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(Error::Parse(format!("Expected a JSON array of articles, got {}", kind_of(&other))));
        }
    };

    let total = items.len();
    let records: Vec<ArticleRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            Value::Object(fields) => Some(record_from(&fields)),
            other => {
                tracing::warn!("⚠️ Skipping element {} of {}: expected an object, got {}", i + 1, total, kind_of(&other));
                None
            }
        })
        .collect();
    tracing::debug!("Decoded {} article records from {} bytes", records.len(), raw.len());
    Ok(records)
}

fn record_from(fields: &Map<String, Value>) -> ArticleRecord {
    let text = |key: &str| fields.get(key).and_then(Value::as_str);
    ArticleRecord::from_parts(text("topic"), text("title"), text("content"))
}

/// Body of the first fenced block, or the text unchanged when there is none.
/// An unterminated fence runs to the end of the text.
fn strip_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    let body = match after.find('\n') {
        Some(newline) => &after[newline + 1..],
        None => after,
    };
    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// The span from the first `[` to the last `]`, inclusive.
fn bracketed(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Text of the first `# ` heading, else of the first `## ` heading.
pub fn extract_heading_title(markdown: &str) -> Option<String> {
    ["# ", "## "].iter().find_map(|marker| {
        markdown
            .lines()
            .map(str::trim_start)
            .find(|line| line.starts_with(marker))
            .map(|line| line[marker.len()..].trim().to_string())
            .filter(|title| !title.is_empty())
    })
}

/// Drops the first `# ` heading line, which the page template renders itself.
pub fn strip_title_heading(markdown: &str) -> String {
    let mut removed = false;
    markdown
        .lines()
        .filter(|line| {
            if !removed && line.trim_start().starts_with("# ") {
                removed = true;
                return false;
            }
            true
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_start()
        .to_string()
}
