//! Append-only activity log on disk
//!
//! One JSON record per line. Lines in the older bracketed text form are
//! still read. Writers are not coordinated across processes.

use imageshield_core::{LogEntry, ShieldError};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Append one entry, creating the file (and its directory) if needed.
    pub fn append(&self, entry: &LogEntry) -> Result<(), ShieldError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let line = entry.to_json_line()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        tracing::debug!(
            module = %entry.module,
            path = %self.path.display(),
            "Appended activity log entry"
        );
        Ok(())
    }

    /// Every well-formed entry in file order. A missing file is an empty log;
    /// malformed lines, including lines that are not UTF-8, are skipped.
    pub fn entries(&self) -> Result<Vec<LogEntry>, ShieldError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (number, raw) in content.split(|byte| *byte == b'\n').enumerate() {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line.trim_end_matches('\r'),
                Err(e) => {
                    tracing::debug!(line = number + 1, error = %e, "Skipping non UTF-8 log line");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match LogEntry::parse_line(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::debug!(line = number + 1, error = %e, "Skipping malformed log line")
                }
            }
        }
        Ok(entries)
    }

    /// Plain-text report, one bracketed line per entry.
    pub fn export_text(&self) -> Result<String, ShieldError> {
        let mut report = String::new();
        for entry in self.entries()? {
            report.push_str(&entry.to_text_line());
            report.push('\n');
        }
        Ok(report)
    }

    /// Delete the log file. Clearing a log that does not exist succeeds.
    pub fn clear(&self) -> Result<(), ShieldError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Activity log cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
