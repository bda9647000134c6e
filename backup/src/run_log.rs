//! Per-run log file.
//!
//! Every run writes exactly one plain-text log, which is mailed to the
//! administrator once the job is over. Entries are written and flushed one
//! at a time so the file can be read back at any point.

use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Success => write!(f, "SUCCESS"),
            Status::Error => write!(f, "ERROR"),
        }
    }
}

/// `HH:MM:SS    [STATUS - ]message`
pub fn format_entry(at: &DateTime<Local>, message: &str, status: Option<Status>) -> String {
    let time = at.format(common::ENTRY_TIME_FORMAT);
    match status {
        Some(status) => format!("{}    {} - {}", time, status, message),
        None => format!("{}    {}", time, message),
    }
}

pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    pub fn new(path: PathBuf, file: File) -> Self {
        Self { path, file }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Failures go to the diagnostic log and are otherwise
    /// swallowed: losing a line must not stop the backup.
    pub fn append(&mut self, message: &str, status: Option<Status>) {
        let line = format_entry(&Local::now(), message, status);
        log::info!(target: "run_log", "{}", line);

        if let Err(e) = writeln!(self.file, "{}", line).and_then(|_| self.file.flush()) {
            log::error!("Failed to write to run log {}: {}", self.path.display(), e);
        }
    }

    pub fn info(&mut self, message: &str) {
        self.append(message, None);
    }

    pub fn success(&mut self, message: &str) {
        self.append(message, Some(Status::Success));
    }

    pub fn error(&mut self, message: &str) {
        self.append(message, Some(Status::Error));
    }

    /// Everything written so far.
    pub fn read_back(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}
