use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub String);

impl JobId {
    pub const PREFIX: &'static str = "job";

    /// Accepts `job` followed by one or more ASCII digits, e.g. `job1` or `job042`.
    pub fn parse(name: &str) -> Result<Self, InvalidJobId> {
        let index = name
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| InvalidJobId(name.to_string()))?;

        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidJobId(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid job name")]
pub struct InvalidJobId(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Dir,
    /// Anything else found in the store; rejected when the job is dispatched.
    Other(String),
}

impl From<&str> for TargetKind {
    fn from(kind: &str) -> Self {
        match kind {
            "file" => TargetKind::File,
            "dir" => TargetKind::Dir,
            other => TargetKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::File => write!(f, "file"),
            TargetKind::Dir => write!(f, "dir"),
            TargetKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// A job as written in the store. Every field is optional here so that a
/// half-written entry only breaks its own job, not the whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobEntry {
    pub target: Option<PathBuf>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub archive: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job '{job}' has no '{field}' setting")]
pub struct MissingField {
    pub job: String,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub target: PathBuf,
    pub kind: TargetKind,
    pub archive: bool,
}

impl Job {
    pub fn from_entry(id: JobId, entry: &JobEntry) -> Result<Self, MissingField> {
        let missing = |field| MissingField {
            job: id.0.clone(),
            field,
        };

        let target = entry.target.clone().ok_or_else(|| missing("target"))?;
        let kind = entry.kind.as_deref().ok_or_else(|| missing("type"))?;
        let archive = entry.archive.ok_or_else(|| missing("archive"))?;

        Ok(Self {
            kind: TargetKind::from(kind),
            id,
            target,
            archive,
        })
    }
}
