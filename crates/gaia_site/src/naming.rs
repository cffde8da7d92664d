//! Artifact file naming.
//!
//! `article_YYYYMMDD_HHMMSS_ffffff.html`: the timestamp prefix is fixed
//! width, so lexicographic order of names is chronological order. Stamps
//! are UTC; local wall clocks repeat an hour when DST ends.

use chrono::{DateTime, NaiveDate, Utc};

pub const ARTICLE_PREFIX: &str = "article_";
pub const ARTICLE_SUFFIX: &str = ".html";

pub fn article_filename(instant: &DateTime<Utc>) -> String {
    format!(
        "{}{}{}",
        ARTICLE_PREFIX,
        instant.format("%Y%m%d_%H%M%S_%6f"),
        ARTICLE_SUFFIX
    )
}

pub fn is_article_filename(name: &str) -> bool {
    name.starts_with(ARTICLE_PREFIX) && name.ends_with(ARTICLE_SUFFIX) && name.len() > ARTICLE_PREFIX.len() + ARTICLE_SUFFIX.len()
}

/// Date embedded after the prefix, when the name carries one.
pub fn date_from_filename(name: &str) -> Option<NaiveDate> {
    let segment = name.strip_prefix(ARTICLE_PREFIX)?.get(..8)?;
    NaiveDate::parse_from_str(segment, "%Y%m%d").ok()
}
