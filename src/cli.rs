use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::digest::paths::resolve_paths;
use crate::logging;

#[derive(Debug, Parser)]
#[command(
    name = "chatlog-digest",
    version,
    about = "Daily chat-log digests summarized by DeepSeek and delivered to Feishu"
)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one digest batch now and exit.
    Run {
        /// Target date (YYYY-MM-DD); defaults to today in the schedule zone.
        #[arg(long)]
        date: Option<String>,
        /// Skip the connectivity probe before the batch.
        #[arg(long)]
        no_probe: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run a digest batch every day at the configured time until interrupted.
    Schedule {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Probe the chat-log API and the completion endpoint.
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the tail of the newest log file.
    Logs {
        #[arg(long, default_value_t = commands::logs::DEFAULT_TAIL_LINES)]
        lines: usize,
    },
    /// Show resolved configuration, credentials and environment overrides.
    Status {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging() -> Result<()> {
    let paths = resolve_paths()?;
    let log_file = logging::init(&paths.logs_dir)?;
    tracing::debug!(log_file = %log_file.display(), "logging initialized");
    Ok(())
}

fn print_report(report: &CommandReport, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let state = if report.ok { "ok" } else { "attention" };
    println!("{}: {state}", report.command);
    for line in &report.details {
        println!("  {line}");
    }
    for issue in &report.issues {
        println!("  ! {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Run {
            date,
            no_probe,
            config,
        } => {
            init_logging()?;
            commands::run::run(&commands::run::RunOptions {
                config,
                date,
                no_probe,
            })?
        }
        Command::Schedule { config } => {
            init_logging()?;
            commands::schedule::run(&commands::schedule::ScheduleOptions { config })?
        }
        Command::Check { config } => {
            init_logging()?;
            commands::check::run(&commands::check::CheckOptions { config })?
        }
        Command::Logs { lines } => {
            commands::logs::run(&commands::logs::LogsOptions { lines })?
        }
        Command::Status { config } => {
            commands::status::run(&commands::status::StatusOptions { config })?
        }
    };

    print_report(&report, cli.json)
}
