use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::commands::{CommandReport, describe_batch};
use crate::digest::config::load_config;
use crate::digest::pipeline::run_configured_batch;
use crate::digest::sink::TracingSink;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub date: Option<String>,
    pub no_probe: bool,
}

fn normalize_date(raw: &str) -> Result<String> {
    let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --date `{raw}`; expected YYYY-MM-DD"))?;
    Ok(parsed.format("%Y-%m-%d").to_string())
}

pub fn run(opts: &RunOptions) -> Result<CommandReport> {
    let loaded = load_config(opts.config.as_deref())?;
    let mut report = CommandReport::new("run");

    let date = match opts.date.as_deref() {
        Some(raw) => normalize_date(raw)?,
        None => loaded.config.schedule.zone()?.today(),
    };
    let probe = loaded.config.probe_before_batch && !opts.no_probe;

    tracing::info!(config = %loaded.path.display(), %date, "starting on-demand digest run");
    let result = run_configured_batch(&loaded, &date, probe, &TracingSink)?;
    describe_batch(&mut report, &result);

    Ok(report)
}
