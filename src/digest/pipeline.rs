use crate::digest::config::LoadedConfig;
use crate::digest::content::{LogContent, is_usable};
use crate::digest::deliver::{Delivery, WebhookClient};
use crate::digest::fetch::{ChatlogClient, FetchError, LogSource};
use crate::digest::probe::{ProbeReport, run_probe};
use crate::digest::prompt::build_prompt;
use crate::digest::sink::{EventSink, Stage};
use crate::digest::summarize::{ChatCompletionClient, Summarizer};
use crate::digest::util::{error_chain, truncate_with_ellipsis};
use anyhow::{Context, Result};
use serde::Serialize;

const PREVIEW_CHARS: usize = 200;

/// Why a group never reached delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    FetchFailed,
    EmptyContent,
    SummaryFailed,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::FetchFailed => "fetch_failed",
            SkipReason::EmptyContent => "empty_content",
            SkipReason::SummaryFailed => "summary_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum GroupOutcome {
    Delivered,
    Skipped(SkipReason),
    DeliveryFailed,
}

impl GroupOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, GroupOutcome::Delivered)
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupOutcome::Delivered => "delivered",
            GroupOutcome::Skipped(reason) => reason.as_str(),
            GroupOutcome::DeliveryFailed => "delivery_failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub group: String,
    pub outcome: GroupOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub date: String,
    pub groups: Vec<GroupReport>,
    pub probe: Option<ProbeReport>,
}

impl BatchResult {
    pub fn attempted(&self) -> usize {
        self.groups.len()
    }

    pub fn succeeded(&self) -> usize {
        self.groups.iter().filter(|g| g.outcome.is_success()).count()
    }

    pub fn tally(&self) -> String {
        format!("{}/{}", self.succeeded(), self.attempted())
    }
}

/// Header line plus blank line in front of the model's summary.
pub fn compose_message(group: &str, date: &str, summary: &str) -> String {
    format!("📊 群聊日报 - {group} ({date})\n\n{summary}")
}

/// One pass of fetch → validate → prompt → summarize → deliver per group.
pub struct Pipeline<'a> {
    pub source: &'a dyn LogSource,
    pub summarizer: &'a dyn Summarizer,
    pub delivery: &'a dyn Delivery,
    pub sink: &'a dyn EventSink,
}

impl Pipeline<'_> {
    fn fetch_usable(&self, group: &str, date: &str) -> Result<LogContent, SkipReason> {
        let sink = self.sink;
        let fetched = match self.source.fetch(group, date) {
            Ok(content) => Some(content),
            Err(FetchError::EmptyBody) => {
                sink.warn(Stage::Fetch, Some(group), "chat log response body is empty");
                None
            }
            Err(err @ FetchError::Status { .. }) => {
                sink.error(Stage::Fetch, Some(group), &err.to_string());
                return Err(SkipReason::FetchFailed);
            }
            Err(err @ FetchError::Transport(_)) => {
                sink.error(Stage::Fetch, Some(group), &error_chain(&err));
                return Err(SkipReason::FetchFailed);
            }
        };

        let content = match fetched {
            Some(content) if is_usable(Some(&content)) => content,
            other => {
                let shape = other.as_ref().map_or("response", LogContent::shape);
                sink.warn(
                    Stage::Validate,
                    Some(group),
                    &format!("skipping group: chat log {shape} is empty"),
                );
                return Err(SkipReason::EmptyContent);
            }
        };
        sink.info(
            Stage::Validate,
            Some(group),
            &format!("fetched chat log ({})", content.describe()),
        );
        sink.debug(
            Stage::Validate,
            Some(group),
            &truncate_with_ellipsis(&content.render(), PREVIEW_CHARS),
        );
        Ok(content)
    }

    /// Process a single group. Every failure is reported through the sink
    /// and turned into an outcome; nothing propagates to the caller.
    pub fn process_group(&self, group: &str, date: &str) -> GroupOutcome {
        let sink = self.sink;
        sink.info(Stage::Batch, Some(group), "processing group");

        let content = match self.fetch_usable(group, date) {
            Ok(content) => content,
            Err(reason) => {
                if reason == SkipReason::FetchFailed {
                    sink.warn(Stage::Batch, Some(group), "skipping group: chat log unavailable");
                }
                return GroupOutcome::Skipped(reason);
            }
        };

        let prompt = build_prompt(group, date, &content);
        sink.debug(
            Stage::Prompt,
            Some(group),
            &format!("prompt built, {} chars", prompt.chars().count()),
        );

        let summary = match self.summarizer.summarize(&prompt) {
            Ok(summary) => summary,
            Err(err) => {
                sink.error(Stage::Summarize, Some(group), &error_chain(&err));
                sink.warn(Stage::Batch, Some(group), "skipping group: no summary produced");
                return GroupOutcome::Skipped(SkipReason::SummaryFailed);
            }
        };
        sink.info(
            Stage::Summarize,
            Some(group),
            &format!("summary received, {} chars", summary.chars().count()),
        );

        let message = compose_message(group, date, &summary);
        match self.delivery.deliver(&message) {
            Ok(()) => {
                sink.info(Stage::Deliver, Some(group), "digest delivered");
                GroupOutcome::Delivered
            }
            Err(err) => {
                sink.error(Stage::Deliver, Some(group), &error_chain(&err));
                GroupOutcome::DeliveryFailed
            }
        }
    }

    /// Run every group in order. One group's failure never stops the rest.
    pub fn run_batch(&self, groups: &[String], date: &str) -> BatchResult {
        let sink = self.sink;
        sink.info(
            Stage::Batch,
            None,
            &format!("processing chat logs for {date}: {} groups", groups.len()),
        );

        let mut reports = Vec::with_capacity(groups.len());
        for group in groups {
            let outcome = self.process_group(group, date);
            reports.push(GroupReport {
                group: group.clone(),
                outcome,
            });
            sink.info(
                Stage::Batch,
                Some(group.as_str()),
                &format!("outcome: {}", outcome.label()),
            );
        }

        let result = BatchResult {
            date: date.to_string(),
            groups: reports,
            probe: None,
        };
        sink.info(
            Stage::Batch,
            None,
            &format!("batch finished: {} groups delivered", result.tally()),
        );
        result
    }
}

/// Build the HTTP stages from config, optionally probe connectivity, then
/// run the batch. Only client construction can fail here.
pub fn run_configured_batch(
    loaded: &LoadedConfig,
    date: &str,
    probe: bool,
    sink: &dyn EventSink,
) -> Result<BatchResult> {
    let cfg = &loaded.config;
    let timeout = cfg.request_timeout();

    let source = ChatlogClient::new(&cfg.chatlog_api_base, timeout)
        .context("failed to build chat log client")?;
    let summarizer = ChatCompletionClient::new(
        &cfg.deepseek_base_url,
        &loaded.credentials.deepseek_api_key,
        &cfg.deepseek_model,
        cfg.deepseek_config.clone(),
        timeout,
    )
    .context("failed to build chat completion client")?;
    let delivery = WebhookClient::new(&loaded.credentials.feishu_webhook, timeout)
        .context("failed to build webhook client")?;

    let probe_report = probe.then(|| run_probe(cfg, &loaded.credentials, date, sink));
    if let Some(report) = &probe_report
        && !report.all_reachable()
    {
        sink.warn(Stage::Probe, None, "continuing batch with unreachable upstream");
    }

    let pipeline = Pipeline {
        source: &source,
        summarizer: &summarizer,
        delivery: &delivery,
        sink,
    };
    let mut result = pipeline.run_batch(&cfg.talkers, date);
    result.probe = probe_report;
    Ok(result)
}
