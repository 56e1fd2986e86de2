pub mod check;
pub mod logs;
pub mod run;
pub mod schedule;
pub mod status;

use crate::digest::pipeline::BatchResult;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Per-group lines shared by `run` and the scheduler. Failed groups are
/// details, not issues: a partial batch is still a completed batch.
pub fn describe_batch(report: &mut CommandReport, result: &BatchResult) {
    report.detail(format!("date={}", result.date));
    if let Some(probe) = &result.probe {
        for target in [&probe.chatlog, &probe.completion] {
            match (target.status, &target.error) {
                (Some(status), _) => report.detail(format!("probe.{}={status}", target.target)),
                (None, Some(err)) => {
                    report.detail(format!("probe.{}=unreachable ({err})", target.target))
                }
                (None, None) => {}
            }
        }
    }
    for group in &result.groups {
        report.detail(format!("group.{}={}", group.group, group.outcome.label()));
    }
    report.detail(format!("delivered={}", result.tally()));
}
