use crate::archive;
use crate::config::Config;
use crate::context::RunContext;
use crate::copy;
use crate::error::JobError;
use crate::run_log::RunLog;
use common::{Job, JobId, TargetKind};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const USAGE_HINT: &str =
    "Example: 'jobbackup job1' - This will perform a backup using the job1 configuration.";

pub struct Executor<'a> {
    config: &'a Config,
    ctx: &'a RunContext,
}

impl<'a> Executor<'a> {
    pub fn new(config: &'a Config, ctx: &'a RunContext) -> Self {
        Self { config, ctx }
    }

    /// Run one job and record the outcome in `log`. Returns the backup
    /// artifact path on success; errors have already been logged.
    pub fn execute(&self, job_name: Option<&str>, log: &mut RunLog) -> Result<PathBuf, JobError> {
        let result = self.run(job_name, log);
        if let Err(e) = &result {
            log.error(&e.to_string());
            if let JobError::Usage(_) = e {
                log.info(USAGE_HINT);
            }
        }
        result
    }

    fn run(&self, job_name: Option<&str>, log: &mut RunLog) -> Result<PathBuf, JobError> {
        let name = job_name.ok_or(JobError::Usage(None))?;
        let id = JobId::parse(name).map_err(|e| JobError::Usage(Some(e.0)))?;
        let job = self.config.job(&id)?;
        log.info(&self.describe(&job));

        if !job.target.exists() {
            return Err(JobError::MissingTarget(job.target));
        }

        self.ensure_backup_folder(log).map_err(|source| JobError::Io {
            job: id.clone(),
            source,
        })?;
        let backup_name = self.backup_name(&job)?;

        let (what, done) = match (&job.kind, job.archive) {
            (TargetKind::File, false) => (
                "file",
                copy::copy_file(&job.target, &backup_name).map(|_| (backup_name, String::new())),
            ),
            (TargetKind::File, true) => {
                let dest = with_zip_extension(&backup_name);
                ("archive", archive::archive_file(&job.target, &dest).map(|_| (dest, String::new())))
            }
            (TargetKind::Dir, false) => (
                "directory",
                copy::copy_tree(&job.target, &backup_name).map(|stats| {
                    let mut summary = format!(
                        " ({} files, {} directories, {} links",
                        stats.files, stats.dirs, stats.links
                    );
                    if stats.skipped > 0 {
                        summary.push_str(&format!(", {} special files skipped", stats.skipped));
                    }
                    summary.push(')');
                    (backup_name, summary)
                }),
            ),
            (TargetKind::Dir, true) => {
                let dest = with_zip_extension(&backup_name);
                let done = archive::archive_tree(&job.target, &dest)
                    .map(|count| (dest, format!(" ({} entries)", count)));
                ("archive", done)
            }
            (TargetKind::Other(kind), _) => return Err(JobError::UnknownKind(kind.clone())),
        };

        let (artifact, summary) = done.map_err(|source| JobError::Io { job: id, source })?;
        log.success(&format!("Created backup {}: '{}'{}", what, artifact.display(), summary));
        Ok(artifact)
    }

    fn describe(&self, job: &Job) -> String {
        format!(
            "--- Job configuration ---\n\
             \x20   Target: {}\n\
             \x20   Type of target: {}\n\
             \x20   Backup output directory: {}\n\
             \x20   Create compressed archive: {}\n\
             \x20   -------------------------",
            job.target.display(),
            job.kind,
            self.config.backup_folder.display(),
            job.archive
        )
    }

    fn ensure_backup_folder(&self, log: &mut RunLog) -> io::Result<()> {
        let folder = &self.config.backup_folder;
        if !folder.exists() {
            log.info("Output directory doesn't exist, creating.");
            fs::create_dir_all(folder)?;
        }
        Ok(())
    }

    /// `<backup folder>/<target base name>.<run stamp>`
    fn backup_name(&self, job: &Job) -> Result<PathBuf, JobError> {
        let base = job.target.file_name().ok_or_else(|| {
            JobError::Config(format!(
                "target '{}' of job '{}' has no file name",
                job.target.display(),
                job.id
            ))
        })?;

        let mut name = base.to_os_string();
        name.push(".");
        name.push(self.ctx.stamp());
        Ok(self.config.backup_folder.join(name))
    }
}

fn with_zip_extension(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".zip");
    PathBuf::from(name)
}
