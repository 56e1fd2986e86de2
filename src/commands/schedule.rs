use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::watch;

use crate::commands::{CommandReport, describe_batch};
use crate::digest::config::load_config;
use crate::digest::pipeline::run_configured_batch;
use crate::digest::scheduler::{DailySchedule, run_daily};
use crate::digest::sink::TracingSink;

#[derive(Debug, Clone, Default)]
pub struct ScheduleOptions {
    pub config: Option<PathBuf>,
}

/// Block in the daily scheduler until Ctrl-C. Config is loaded once up front
/// so a broken setup fails immediately instead of at the first trigger.
pub fn run(opts: &ScheduleOptions) -> Result<CommandReport> {
    let loaded = load_config(opts.config.as_deref())?;
    let schedule = DailySchedule {
        at: loaded.config.schedule.at_time()?,
        zone: loaded.config.schedule.zone()?,
    };
    let mut report = CommandReport::new("schedule");
    report.detail(format!("schedule.at={}", schedule.at.format("%H:%M")));
    report.detail(format!("schedule.zone={}", schedule.zone.label()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start scheduler runtime")?;

    let probe = loaded.config.probe_before_batch;
    runtime.block_on(async move {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; stopping after the current run");
                let _ = shutdown_tx.send(true);
            }
        });

        tracing::info!(
            at = %schedule.at.format("%H:%M"),
            zone = %schedule.zone.label(),
            "daily scheduler started; press Ctrl+C to stop"
        );
        run_daily(schedule, shutdown_rx, move |date| {
            match run_configured_batch(&loaded, &date, probe, &TracingSink) {
                Ok(result) => {
                    let mut run_report = CommandReport::new("scheduled-run");
                    describe_batch(&mut run_report, &result);
                    tracing::info!(details = %run_report.details.join(" "), "scheduled run summary");
                }
                Err(err) => tracing::error!("scheduled run failed: {err:#}"),
            }
        })
        .await;
    });

    report.detail("scheduler stopped");
    Ok(report)
}
