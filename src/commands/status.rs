use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::digest::config::{
    Credentials, DEEPSEEK_API_KEY_VAR, FEISHU_WEBHOOK_VAR, load_file_config,
};
use crate::digest::paths::resolve_paths;
use crate::digest::util::mask_secret;

include!(concat!(env!("OUT_DIR"), "/digest_env_allowlist.rs"));

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub config: Option<PathBuf>,
}

pub fn run(opts: &StatusOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("digest_home={}", paths.digest_home.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));

    match load_file_config(opts.config.as_deref()) {
        Ok((path, cfg)) => {
            report.detail(format!("config_file={}", path.display()));
            report.detail(format!("chatlog_api_base={}", cfg.chatlog_api_base));
            report.detail(format!("deepseek_base_url={}", cfg.deepseek_base_url));
            report.detail(format!("deepseek_model={}", cfg.deepseek_model));
            report.detail(format!(
                "deepseek_config.temperature={}",
                cfg.deepseek_config.temperature
            ));
            report.detail(format!(
                "deepseek_config.max_tokens={}",
                cfg.deepseek_config.max_tokens
            ));
            report.detail(format!("talkers={}", cfg.talkers.join(",")));
            report.detail(format!("schedule.at={}", cfg.schedule.at));
            report.detail(format!(
                "schedule.timezone={}",
                cfg.schedule.timezone.as_deref().unwrap_or("local")
            ));
            report.detail(format!(
                "request_timeout_secs={}",
                cfg.request_timeout_secs
                    .map_or_else(|| "none".to_string(), |s| s.to_string())
            ));
            report.detail(format!("probe_before_batch={}", cfg.probe_before_batch));
        }
        Err(err) => report.issue(format!("config: {err}")),
    }

    match Credentials::from_env() {
        Ok(creds) => {
            report.detail(format!(
                "{DEEPSEEK_API_KEY_VAR}={}",
                mask_secret(&creds.deepseek_api_key)
            ));
            report.detail(format!(
                "{FEISHU_WEBHOOK_VAR}={}",
                mask_secret(&creds.feishu_webhook)
            ));
        }
        Err(err) => report.issue(format!("credentials: {err}")),
    }

    for key in GENERATED_ENV_ALLOWLIST {
        let state = if env::var_os(key).is_some() { "set" } else { "unset" };
        report.detail(format!("env.{key}={state}"));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::GENERATED_ENV_ALLOWLIST;

    #[test]
    fn allowlist_covers_recognized_overrides() {
        for key in [
            "DIGEST_CONFIG_PATH",
            "DIGEST_HOME",
            "DIGEST_LOGS_DIR",
            "DIGEST_SCHEDULE_AT",
            "DIGEST_TIMEZONE",
            "DIGEST_REQUEST_TIMEOUT_SECS",
            "DIGEST_PROBE",
        ] {
            assert!(GENERATED_ENV_ALLOWLIST.contains(&key), "{key}");
        }
    }
}
