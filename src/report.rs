//! Run log and merge report.
//!
//! Every noteworthy event of a run is appended to a [`RunLog`]; at the end
//! the log plus the run statistics are rendered into a timestamped
//! `merge_report_<YYYYMMDD_HHMMSS>.txt` next to the unit files, so a batch
//! operator can audit what happened without scrolling terminal output.

use crate::error::Result;
use crate::merge::MergeStatistics;
use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Normal progress.
    Info,
    /// Something degraded but the run continued.
    Warning,
    /// Something failed.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("INFO"),
            Self::Warning => f.write_str("WARN"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// One logged event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

/// Accumulates the events of one assembly run.
#[derive(Debug)]
pub struct RunLog {
    started: DateTime<Local>,
    entries: Vec<LogEntry>,
}

impl RunLog {
    /// Start a new log, stamped now.
    pub fn new() -> Self {
        Self {
            started: Local::now(),
            entries: Vec::new(),
        }
    }

    /// Append an informational entry.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    /// Append a warning.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message.into());
    }

    /// Append an error.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        self.entries.push(LogEntry { level, message });
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of warnings logged.
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.level == LogLevel::Warning)
            .count()
    }

    /// Number of errors logged.
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.level == LogLevel::Error)
            .count()
    }

    /// Render the report text.
    pub fn render(&self, statistics: &MergeStatistics) -> String {
        let mut out = String::new();
        out.push_str("=== Merge Report ===\n");
        out.push_str(&format!(
            "Generated: {}\n\n",
            self.started.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("Units total:     {}\n", statistics.units_total));
        out.push_str(&format!("Units succeeded: {}\n", statistics.units_succeeded));
        out.push_str(&format!("Units failed:    {}\n", statistics.units_failed));
        out.push_str(&format!("Pages written:   {}\n", statistics.pages_written));
        out.push_str(&format!("Files written:   {}\n", statistics.files_written));
        out.push_str(&format!("Warnings:        {}\n", self.warning_count()));
        out.push_str(&format!("Errors:          {}\n", self.error_count()));
        out.push_str(&format!(
            "Elapsed:         {:.1}s\n",
            statistics.duration.as_secs_f64()
        ));
        out.push_str("\n--- Log ---\n");
        for (index, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!(
                "{:3}. [{}] {}\n",
                index + 1,
                entry.level,
                entry.message
            ));
        }
        out
    }

    /// Write the report into `dir` and return its path.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub async fn save(&self, dir: &Path, statistics: &MergeStatistics) -> Result<PathBuf> {
        let name = format!(
            "merge_report_{}.txt",
            self.started.format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(name);
        tokio::fs::write(&path, self.render(statistics)).await?;
        Ok(path)
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}
