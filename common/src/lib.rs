pub mod job;

pub use job::{InvalidJobId, Job, JobEntry, JobId, MissingField, TargetKind};

// Configuration lookup, in order of precedence
pub const CONFIG_ENV: &str = "JOBBACKUP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/jobbackup/config.yaml";
pub const USER_CONFIG_PATH: &str = "jobbackup.yaml";

pub const SMTP_PASSWORD_ENV: &str = "JOBBACKUP_SMTP_PASSWORD";
pub const DEFAULT_SMTP_PORT: u16 = 465;

// Relative to the working directory unless configured otherwise
pub const DEFAULT_BACKUP_FOLDER: &str = "Backups";
pub const DEFAULT_LOG_FOLDER: &str = "Logs";

/// Timestamp shared by the run log name and the backup artifact name.
pub const RUN_STAMP_FORMAT: &str = "%y%m%d-%H%M%S";
/// Time of day prefixed to every run log entry.
pub const ENTRY_TIME_FORMAT: &str = "%H:%M:%S";
