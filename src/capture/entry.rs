//! Captured log lines and the channels they come from

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// One of the two process output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    /// Primary output (stdout)
    Stdout,
    /// Error output (stderr)
    Stderr,
}

impl Channel {
    /// Both channels, primary first
    pub const ALL: [Channel; 2] = [Channel::Stdout, Channel::Stderr];

    /// Get the display name for this channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Stdout => "STDOUT",
            Channel::Stderr => "STDERR",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single captured line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Capture instant, millisecond resolution
    pub timestamp: DateTime<Utc>,
    /// Decoded text of the line, without its terminator
    pub message: String,
    /// Channel the line was written to
    pub source: Channel,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn new(message: impl Into<String>, source: Channel) -> Self {
        Self::at(Utc::now(), message, source)
    }

    /// Create an entry with an explicit timestamp
    pub fn at(timestamp: DateTime<Utc>, message: impl Into<String>, source: Channel) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(3),
            message: message.into(),
            source,
        }
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Format the timestamp as `HH:MM:SS.mmm` (UTC)
    pub fn format_timestamp(&self) -> String {
        self.timestamp.format("%H:%M:%S%.3f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let entry = LogEntry::at(ts, "msg", Channel::Stdout);
        assert_eq!(entry.format_timestamp(), "22:13:20.123");
        assert_eq!(entry.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_timestamp_truncated_to_millis() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let entry = LogEntry::at(ts, "msg", Channel::Stderr);
        assert_eq!(entry.timestamp.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::Stdout.as_str(), "STDOUT");
        assert_eq!(Channel::Stderr.to_string(), "STDERR");
        assert_eq!(
            serde_json::to_string(&Channel::Stderr).unwrap(),
            "\"STDERR\""
        );
    }
}
