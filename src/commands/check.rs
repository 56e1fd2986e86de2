use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::digest::config::load_config;
use crate::digest::probe::run_probe;
use crate::digest::sink::TracingSink;

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub config: Option<PathBuf>,
}

pub fn run(opts: &CheckOptions) -> Result<CommandReport> {
    let loaded = load_config(opts.config.as_deref())?;
    let mut report = CommandReport::new("check");
    let date = loaded.config.schedule.zone()?.today();

    let probe = run_probe(&loaded.config, &loaded.credentials, &date, &TracingSink);
    for target in [&probe.chatlog, &probe.completion] {
        report.detail(format!("{}.url={}", target.target, target.url));
        match (target.status, &target.error) {
            (Some(status), _) => report.detail(format!("{}.status={status}", target.target)),
            (None, Some(err)) => report.issue(format!("{} unreachable: {err}", target.target)),
            (None, None) => report.issue(format!("{} was not probed", target.target)),
        }
    }

    Ok(report)
}
