//! Channel filter and text search over captured entries

use serde::{Deserialize, Serialize};

use crate::capture::{Channel, LogEntry};

/// Which channels to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFilter {
    /// Entries from both channels
    #[default]
    All,
    /// Primary output only
    Stdout,
    /// Error output only
    Stderr,
}

impl LogFilter {
    /// Every filter, in menu order
    pub const ALL: [LogFilter; 3] = [LogFilter::All, LogFilter::Stdout, LogFilter::Stderr];

    /// Get the display name for this filter
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFilter::All => "ALL",
            LogFilter::Stdout => "STDOUT",
            LogFilter::Stderr => "STDERR",
        }
    }

    /// Check whether entries from `channel` pass
    pub fn accepts(&self, channel: Channel) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Stdout => channel == Channel::Stdout,
            LogFilter::Stderr => channel == Channel::Stderr,
        }
    }
}

/// Filter plus search text, applied on the consumer side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub filter: LogFilter,
    search: String,
}

impl LogQuery {
    /// Query matching everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a channel filter
    pub fn with_filter(mut self, filter: LogFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Restrict to messages containing `search` (case-insensitive)
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.set_search(search);
        self
    }

    /// Replace the search text
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into().to_lowercase();
    }

    /// The current search text, lowercased
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Check whether an entry passes both filter and search
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.filter.accepts(entry.source)
            && (self.search.is_empty() || entry.message.to_lowercase().contains(&self.search))
    }

    /// Matching entries, order preserved
    pub fn apply(&self, entries: &[LogEntry]) -> Vec<LogEntry> {
        entries
            .iter()
            .filter(|e| self.matches(e))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<LogEntry> {
        vec![
            LogEntry::new("Server started", Channel::Stdout),
            LogEntry::new("connection refused", Channel::Stderr),
            LogEntry::new("Connection accepted", Channel::Stdout),
        ]
    }

    fn messages(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_default_query_matches_everything() {
        let entries = sample();
        assert_eq!(LogQuery::new().apply(&entries), entries);
    }

    #[test]
    fn test_channel_filter() {
        let entries = sample();
        let stderr = LogQuery::new().with_filter(LogFilter::Stderr).apply(&entries);
        assert_eq!(messages(&stderr), vec!["connection refused"]);

        let stdout = LogQuery::new().with_filter(LogFilter::Stdout).apply(&entries);
        assert_eq!(messages(&stdout), vec!["Server started", "Connection accepted"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let entries = sample();
        let found = LogQuery::new().with_search("CONNECTION").apply(&entries);
        assert_eq!(messages(&found), vec!["connection refused", "Connection accepted"]);
    }

    #[test]
    fn test_filter_and_search_combine() {
        let entries = sample();
        let query = LogQuery::new()
            .with_filter(LogFilter::Stdout)
            .with_search("connection");
        assert_eq!(messages(&query.apply(&entries)), vec!["Connection accepted"]);
    }

    #[test]
    fn test_filter_names() {
        let names: Vec<_> = LogFilter::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(names, vec!["ALL", "STDOUT", "STDERR"]);
    }
}
