use common::JobId;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a job. None of these abort the run: they are
/// written to the run log and the log is still mailed.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{}", usage_message(.0))]
    Usage(Option<String>),

    #[error("Configuration error: {0}. Please confirm the configuration file is correct.")]
    Config(String),

    #[error("Target '{}' does not exist, exiting.", .0.display())]
    MissingTarget(PathBuf),

    #[error("Unknown target type: {0}.")]
    UnknownKind(String),

    #[error("An unexpected error has occurred processing: {job}: {source}")]
    Io {
        job: JobId,
        #[source]
        source: std::io::Error,
    },
}

fn usage_message(name: &Option<String>) -> String {
    match name {
        Some(name) => format!("'{}' is not a valid job name, nothing to do.", name),
        None => "Nothing to do, valid job name must be passed via commandline.".to_string(),
    }
}

impl JobError {
    /// sysexits(3) code reported when strict exit codes are enabled.
    pub fn exit_code(&self) -> u8 {
        match self {
            JobError::Usage(_) => 64,
            JobError::MissingTarget(_) => 66,
            JobError::Io { .. } => 74,
            JobError::Config(_) | JobError::UnknownKind(_) => 78,
        }
    }
}
