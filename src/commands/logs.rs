use anyhow::Result;

use crate::commands::CommandReport;
use crate::digest::paths::resolve_paths;
use crate::logging::{latest_log_file, tail_lines};

pub const DEFAULT_TAIL_LINES: usize = 30;

#[derive(Debug, Clone)]
pub struct LogsOptions {
    pub lines: usize,
}

impl Default for LogsOptions {
    fn default() -> Self {
        Self {
            lines: DEFAULT_TAIL_LINES,
        }
    }
}

pub fn run(opts: &LogsOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("logs");

    if !paths.logs_dir.exists() {
        report.issue(format!("log directory missing ({})", paths.logs_dir.display()));
        return Ok(report);
    }
    let Some(latest) = latest_log_file(&paths.logs_dir)? else {
        report.issue(format!("no log files in {}", paths.logs_dir.display()));
        return Ok(report);
    };

    report.detail(format!("log_file={}", latest.display()));
    for line in tail_lines(&latest, opts.lines)? {
        report.detail(line);
    }
    Ok(report)
}
