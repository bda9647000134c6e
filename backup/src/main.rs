use anyhow::Context;
use clap::Parser;
use jobbackup::config::LoggingConfig;
use jobbackup::{Config, SmtpMailer};
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Job to run: `job` followed by its number, e.g. job1
    #[arg(allow_hyphen_values = true)]
    job: Option<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = Config::locate();
    let config = Config::from_file(&config_path)?;
    setup_logging(&config.logging)?;
    log::debug!("Loaded configuration from {:?}", config_path);

    let mailer = SmtpMailer::from_env(&config.mail);
    let summary = jobbackup::run(cli.job.as_deref(), &config, &mailer)?;

    match &summary.outcome {
        Ok(artifact) => log::info!("Backup written to {}", artifact.display()),
        Err(e) => log::warn!("Job did not complete: {}", e),
    }
    log::info!("Run log: {}", summary.log_path.display());

    Ok(ExitCode::from(summary.exit_code(config.exit_codes)))
}

fn setup_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let level: log::LevelFilter = logging
        .level
        .parse()
        .with_context(|| format!("Invalid log level: {}", logging.level))?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Some(output) = &logging.output {
        dispatch = dispatch.chain(fern::log_file(output)?);
    }

    dispatch.apply()?;
    Ok(())
}
