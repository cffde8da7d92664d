use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when the backend returns a record without a title.
pub const UNTITLED: &str = "Untitled Article";

/// A normalized subject to write about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Selects the timeout budget of a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Single,
    Bulk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub structured: bool,
    pub kind: RequestKind,
}

impl GenerationRequest {
    /// Free-form request for one article.
    pub fn single(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            structured: false,
            kind: RequestKind::Single,
        }
    }

    /// Structured request expected to return several article records.
    pub fn bulk(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            structured: true,
            kind: RequestKind::Bulk,
        }
    }
}

/// One article as returned by the backend, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub topic: String,
    pub title: String,
    pub content: String,
}

impl ArticleRecord {
    /// Builds a record from possibly missing fields.
    ///
    /// A blank title becomes [`UNTITLED`], a blank topic falls back to the
    /// title and missing content stays empty.
    pub fn from_parts(topic: Option<&str>, title: Option<&str>, content: Option<&str>) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED)
            .to_string();
        let topic = topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| title.clone());
        Self {
            topic,
            title,
            content: content.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublishedArticle {
    pub filename: String,
    pub path: PathBuf,
    pub title: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
}

/// What happens to earlier artifacts of a topic when it is published again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PublishPolicy {
    /// Keep every earlier artifact.
    #[default]
    Add,
    /// Remove earlier artifacts of the same topic once the new one is written.
    Replace,
}

/// Prompt flavour for single-topic generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ArticleKind {
    #[default]
    Article,
    News,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Bulk,
    Single,
    Regenerate,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Bulk => "Bulk",
            RunMode::Single => "Single",
            RunMode::Regenerate => "Regenerate",
        };
        f.write_str(name)
    }
}

/// Terminal accounting of one scheduler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub mode: RunMode,
    pub requested: usize,
    pub processed: usize,
    pub published: usize,
    pub failed_batches: usize,
    pub failed_articles: usize,
}

impl RunSummary {
    pub fn new(mode: RunMode, requested: usize) -> Self {
        Self {
            mode,
            requested,
            processed: 0,
            published: 0,
            failed_batches: 0,
            failed_articles: 0,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} run: requested {}, processed {}, published {} ({} failed batches, {} failed articles)",
            self.mode,
            self.requested,
            self.processed,
            self.published,
            self.failed_batches,
            self.failed_articles
        )
    }
}
