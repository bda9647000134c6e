use crate::run_log::RunLog;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

const MAX_SAME_SECOND_RUNS: u32 = 1000;

/// Facts fixed at the start of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    stamp: String,
    log_path: PathBuf,
}

impl RunContext {
    pub fn start(log_folder: &Path) -> io::Result<(Self, RunLog)> {
        Self::start_at(log_folder, Local::now())
    }

    /// Creates the log folder and claims a fresh `backup.<stamp>.log` in it.
    /// A run landing in the same second as an earlier one gets `<stamp>-1`,
    /// `<stamp>-2` and so on, so neither its log nor its backup clobbers the
    /// earlier run's.
    pub fn start_at(log_folder: &Path, started: DateTime<Local>) -> io::Result<(Self, RunLog)> {
        fs::create_dir_all(log_folder)?;
        let base = started.format(common::RUN_STAMP_FORMAT).to_string();

        for attempt in 0..MAX_SAME_SECOND_RUNS {
            let stamp = match attempt {
                0 => base.clone(),
                n => format!("{}-{}", base, n),
            };
            let log_path = log_folder.join(format!("backup.{}.log", stamp));

            match OpenOptions::new().append(true).create_new(true).open(&log_path) {
                Ok(file) => {
                    let log = RunLog::new(log_path.clone(), file);
                    return Ok((Self { stamp, log_path }, log));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free log file name for stamp {} in {}", base, log_folder.display()),
        ))
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
