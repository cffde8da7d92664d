use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use gaia_core::{Error, Result, RunMode};

pub const HEADER: &str = "Timestamp,Count,Mode";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub count: usize,
    pub mode: String,
}

/// Appends one run to the CSV history, writing the header for a new file.
pub fn append_history(path: &Path, count: usize, mode: RunMode) -> Result<()> {
    append_history_at(path, count, mode, Local::now().naive_local())
}

fn append_history_at(path: &Path, count: usize, mode: RunMode, now: NaiveDateTime) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let is_new = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if is_new {
        writeln!(file, "{}", HEADER)?;
    }
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    writeln!(file, "{},{},{}", timestamp, count, mode)?;
    tracing::info!("🧾 Logged run: {}, {} articles, mode {}", timestamp, count, mode);
    Ok(())
}

/// The last `limit` rows, oldest first. A missing file is an empty history.
pub fn read_history(path: &Path, limit: usize) -> Result<Vec<HistoryEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    let mut entries = text
        .lines()
        .filter(|line| !line.trim().is_empty() && *line != HEADER)
        .map(parse_row)
        .collect::<Result<Vec<_>>>()?;
    let skip = entries.len().saturating_sub(limit);
    Ok(entries.split_off(skip))
}

fn parse_row(line: &str) -> Result<HistoryEntry> {
    let mut fields = line.splitn(3, ',');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(timestamp), Some(count), Some(mode)) => Ok(HistoryEntry {
            timestamp: timestamp.to_string(),
            count: count
                .trim()
                .parse()
                .map_err(|_| Error::Parse(format!("Invalid history count in row {:?}", line)))?,
            mode: mode.trim().to_string(),
        }),
        _ => Err(Error::Parse(format!("Malformed history row {:?}", line))),
    }
}
