//! Text and JSON export of captured entries

use anyhow::{Context, Result};

use crate::capture::LogEntry;

/// Format one entry as `[HH:MM:SS.mmm] [CHANNEL] message`
pub fn format_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] [{}] {}",
        entry.format_timestamp(),
        entry.source.as_str(),
        entry.message
    )
}

/// Newline-joined text export, one entry per line
pub fn export_text(entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON array export
pub fn export_json(entries: &[LogEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries).context("Failed to serialize log entries")
}
