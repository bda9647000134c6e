use crate::error::JobError;
use anyhow::{bail, Context, Result};
use common::{Job, JobEntry, JobId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub sender: String,
    pub receiver: String,
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Login name for the relay; the sender address when unset.
    pub username: Option<String>,
}

fn default_smtp_port() -> u16 { common::DEFAULT_SMTP_PORT }

impl MailConfig {
    pub fn login(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.sender)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

/// How the process exit status reflects the job outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitCodes {
    /// Exit 0 whenever the run completes, whatever happened to the job.
    #[default]
    Compat,
    /// Exit with the job error's sysexits code.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub administrator: String,
    #[serde(default = "default_backup_folder")]
    pub backup_folder: PathBuf,
    #[serde(default = "default_log_folder")]
    pub log_folder: PathBuf,
    #[serde(default)]
    pub exit_codes: ExitCodes,
    pub mail: MailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub jobs: BTreeMap<String, JobEntry>,
}

fn default_backup_folder() -> PathBuf { PathBuf::from(common::DEFAULT_BACKUP_FOLDER) }
fn default_log_folder() -> PathBuf { PathBuf::from(common::DEFAULT_LOG_FOLDER) }

impl Config {
    /// Read the job store and settings; the extension picks the parser.
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !matches!(ext, "yaml" | "yml" | "toml") {
            bail!("Backup configuration {:?} must be .yaml, .yml or .toml", path);
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read backup configuration {:?}", path))?;
        let parsed = match ext {
            "toml" => toml::from_str(&text).map_err(anyhow::Error::from),
            _ => serde_yaml::from_str(&text).map_err(anyhow::Error::from),
        };
        parsed.with_context(|| format!("Invalid backup configuration {:?}", path))
    }

    /// `$JOBBACKUP_CONFIG`, then the system-wide file, then one in the working directory.
    pub fn locate() -> PathBuf {
        if let Ok(path) = std::env::var(common::CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let system = Path::new(common::DEFAULT_CONFIG_PATH);
        if system.exists() {
            system.to_path_buf()
        } else {
            PathBuf::from(common::USER_CONFIG_PATH)
        }
    }

    /// Resolve a validated job name against the store.
    pub fn job(&self, id: &JobId) -> Result<Job, JobError> {
        let entry = self.jobs.get(id.as_str()).ok_or_else(|| {
            JobError::Config(format!("no job named '{}' in configuration", id))
        })?;
        Job::from_entry(id.clone(), entry).map_err(|e| JobError::Config(e.to_string()))
    }
}
