pub mod archive;
pub mod config;
pub mod context;
pub mod copy;
pub mod error;
pub mod executor;
pub mod notifier;
pub mod run_log;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::PathBuf;

pub use config::{Config, ExitCodes};
pub use context::RunContext;
pub use error::JobError;
pub use executor::Executor;
pub use notifier::{Mailer, Notification, Notifier, SmtpMailer};
pub use run_log::{RunLog, Status};

/// What one invocation did.
#[derive(Debug)]
pub struct RunSummary {
    pub log_path: PathBuf,
    pub outcome: Result<PathBuf, JobError>,
    pub notified: bool,
}

impl RunSummary {
    pub fn exit_code(&self, policy: ExitCodes) -> u8 {
        match (policy, &self.outcome) {
            (ExitCodes::Compat, _) => 0,
            (ExitCodes::Strict, Err(e)) => e.exit_code(),
            (ExitCodes::Strict, Ok(_)) if !self.notified => 75,
            (ExitCodes::Strict, Ok(_)) => 0,
        }
    }
}

pub fn run(job_name: Option<&str>, config: &Config, mailer: &dyn Mailer) -> Result<RunSummary> {
    run_at(job_name, config, mailer, Local::now())
}

/// Execute one job and mail its log. Only failing to set up the run log is
/// an error here; everything after that ends up in the log itself.
pub fn run_at(
    job_name: Option<&str>,
    config: &Config,
    mailer: &dyn Mailer,
    now: DateTime<Local>,
) -> Result<RunSummary> {
    let (ctx, mut log) = RunContext::start_at(&config.log_folder, now)
        .with_context(|| format!("Failed to create run log in {:?}", config.log_folder))?;
    log::debug!("Run log for {:?} at {}", job_name, ctx.log_path().display());

    log.info(&format!("Starting '{}'", job_name.unwrap_or_default()));
    let outcome = Executor::new(config, &ctx).execute(job_name, &mut log);
    let notified = Notifier::new(config).notify(&mut log, mailer);

    Ok(RunSummary {
        log_path: ctx.log_path().to_path_buf(),
        outcome,
        notified,
    })
}
