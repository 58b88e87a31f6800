//! Activity log records
//!
//! One [`LogEntry`] is written per module invocation. Entries are stored as one
//! JSON object per line; the bracketed text form
//! `[<YYYY-MM-DD HH:MM:SS>] <Module>: <details>` is still rendered for the
//! exported report and accepted when reading older log files.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::LOG_TIMESTAMP_FORMAT;
use crate::models::tool::ToolModule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub module: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogEntryParseError {
    #[error("empty line")]
    Empty,
    #[error("missing ']' after timestamp")]
    MissingTimestampDelimiter,
    #[error("missing ':' after module name")]
    MissingModuleDelimiter,
    #[error("invalid JSON record: {0}")]
    InvalidJson(String),
}

impl LogEntry {
    /// Entry for `module` stamped with the current local time.
    pub fn now(module: ToolModule, details: impl Into<String>) -> Self {
        Self::at(module, Local::now().naive_local(), details)
    }

    pub fn at(module: ToolModule, time: NaiveDateTime, details: impl Into<String>) -> Self {
        Self {
            timestamp: time.format(LOG_TIMESTAMP_FORMAT).to_string(),
            module: module.name().to_string(),
            details: single_line(&details.into()),
        }
    }

    /// The module this entry belongs to, when it names a known one.
    pub fn tool_module(&self) -> Option<ToolModule> {
        ToolModule::parse(&self.module)
    }

    /// Timestamp parsed back into a date-time, if it is well-formed.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, LOG_TIMESTAMP_FORMAT).ok()
    }

    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Bracketed text form used by the exported report.
    pub fn to_text_line(&self) -> String {
        format!("[{}] {}: {}", self.timestamp, self.module, self.details)
    }

    /// Parse one stored line in either the JSON or the bracketed text form.
    pub fn parse_line(line: &str) -> Result<Self, LogEntryParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(LogEntryParseError::Empty);
        }

        if line.starts_with('{') {
            return serde_json::from_str(line)
                .map_err(|e| LogEntryParseError::InvalidJson(e.to_string()));
        }

        Self::parse_text_line(line)
    }

    /// Split on the first `]` and on the first `:` after it.
    fn parse_text_line(line: &str) -> Result<Self, LogEntryParseError> {
        let (head, rest) = line
            .split_once(']')
            .ok_or(LogEntryParseError::MissingTimestampDelimiter)?;
        let (module, details) = rest
            .split_once(':')
            .ok_or(LogEntryParseError::MissingModuleDelimiter)?;

        Ok(Self {
            timestamp: head.trim_start_matches('[').trim().to_string(),
            module: module.trim().to_string(),
            details: details.trim().to_string(),
        })
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap()
    }

    #[test]
    fn test_text_line_format() {
        let entry = LogEntry::at(ToolModule::CleanScan, fixed_time(), "Face blurring applied");
        assert_eq!(
            entry.to_text_line(),
            "[2024-05-17 14:03:09] CleanScan: Face blurring applied"
        );
    }

    #[test]
    fn test_parse_text_line_splits_after_bracket() {
        let entry = LogEntry::parse_line(
            "[2024-05-17 14:03:09] SafeShare: Watermark: 'SAFE SHARE', Opacity: 100, Angle: 45",
        )
        .unwrap();
        assert_eq!(entry.timestamp, "2024-05-17 14:03:09");
        assert_eq!(entry.module, "SafeShare");
        assert_eq!(
            entry.details,
            "Watermark: 'SAFE SHARE', Opacity: 100, Angle: 45"
        );
        assert_eq!(entry.tool_module(), Some(ToolModule::SafeShare));
        assert_eq!(entry.parsed_timestamp(), Some(fixed_time()));
    }

    #[test]
    fn test_parse_json_line() {
        let entry = LogEntry::at(ToolModule::NoiseGuard, fixed_time(), "Mode: blur, Intensity: 10");
        let line = entry.to_json_line().unwrap();
        assert_eq!(LogEntry::parse_line(&line).unwrap(), entry);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert_eq!(LogEntry::parse_line("   "), Err(LogEntryParseError::Empty));
        assert_eq!(
            LogEntry::parse_line("no delimiters at all"),
            Err(LogEntryParseError::MissingTimestampDelimiter)
        );
        assert_eq!(
            LogEntry::parse_line("[2024-05-17 14:03:09] CleanScan"),
            Err(LogEntryParseError::MissingModuleDelimiter)
        );
        assert!(matches!(
            LogEntry::parse_line("{not json"),
            Err(LogEntryParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_details_are_kept_on_one_line() {
        let entry = LogEntry::at(ToolModule::SafeShare, fixed_time(), "line one\nline two");
        assert_eq!(entry.details, "line one line two");
        assert_eq!(entry.to_text_line().lines().count(), 1);
    }
}
