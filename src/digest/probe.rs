use crate::digest::config::{Credentials, DigestConfig};
use crate::digest::fetch::chatlog_url;
use crate::digest::http::build_client;
use crate::digest::sink::{EventSink, Stage};
use crate::digest::summarize::completions_url;
use crate::digest::util::error_chain;
use serde::Serialize;
use std::time::Duration;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TALKER: &str = "test";

#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    pub target: &'static str,
    pub url: String,
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// Reachable means an HTTP answer came back, whatever its status.
    pub fn reachable(&self) -> bool {
        self.status.is_some()
    }

    fn describe(&self) -> String {
        match (&self.status, &self.error) {
            (Some(status), _) => format!("{} connectivity: {status}", self.target),
            (None, Some(err)) => format!("{} unreachable: {err}", self.target),
            (None, None) => format!("{} not probed", self.target),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub chatlog: ProbeOutcome,
    pub completion: ProbeOutcome,
}

impl ProbeReport {
    pub fn all_reachable(&self) -> bool {
        self.chatlog.reachable() && self.completion.reachable()
    }
}

fn outcome(
    target: &'static str,
    url: String,
    result: reqwest::Result<reqwest::blocking::Response>,
) -> ProbeOutcome {
    match result {
        Ok(response) => ProbeOutcome {
            target,
            url,
            status: Some(response.status().as_u16()),
            error: None,
        },
        Err(err) => ProbeOutcome {
            target,
            url,
            status: None,
            error: Some(error_chain(&err)),
        },
    }
}

/// Lightweight reachability check of both upstream services. Results are
/// informational; failures are reported as warnings and never abort anything.
pub fn run_probe(
    cfg: &DigestConfig,
    credentials: &Credentials,
    date: &str,
    sink: &dyn EventSink,
) -> ProbeReport {
    sink.info(Stage::Probe, None, "testing upstream connectivity");

    let client = match build_client(Some(PROBE_TIMEOUT)) {
        Ok(client) => client,
        Err(err) => {
            let error = Some(error_chain(&err));
            sink.warn(Stage::Probe, None, &format!("probe client unavailable: {err}"));
            return ProbeReport {
                chatlog: ProbeOutcome {
                    target: "chatlog",
                    url: cfg.chatlog_api_base.clone(),
                    status: None,
                    error: error.clone(),
                },
                completion: ProbeOutcome {
                    target: "completion",
                    url: completions_url(&cfg.deepseek_base_url),
                    status: None,
                    error,
                },
            };
        }
    };

    let chatlog_probe_url = chatlog_url(&cfg.chatlog_api_base, date, PROBE_TALKER);
    let chatlog = outcome(
        "chatlog",
        chatlog_probe_url.clone(),
        client.get(&chatlog_probe_url).send(),
    );

    let completion_probe_url = completions_url(&cfg.deepseek_base_url);
    let payload = serde_json::json!({
        "model": cfg.deepseek_model,
        "messages": [{"role": "user", "content": "测试"}],
        "max_tokens": 10
    });
    let completion = outcome(
        "completion",
        completion_probe_url.clone(),
        client
            .post(&completion_probe_url)
            .bearer_auth(&credentials.deepseek_api_key)
            .json(&payload)
            .send(),
    );

    for probe in [&chatlog, &completion] {
        if probe.reachable() {
            sink.info(Stage::Probe, None, &probe.describe());
        } else {
            sink.warn(Stage::Probe, None, &probe.describe());
        }
    }

    ProbeReport { chatlog, completion }
}
