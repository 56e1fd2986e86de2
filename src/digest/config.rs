use crate::digest::paths::resolve_paths;
use crate::digest::scheduler::ScheduleZone;
use crate::error::ConfigError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEEPSEEK_API_KEY_VAR: &str = "DEEPSEEK_API_KEY";
pub const FEISHU_WEBHOOK_VAR: &str = "FEISHU_WEBHOOK";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_schedule_at")]
    pub at: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

fn default_schedule_at() -> String {
    "18:00".to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            at: default_schedule_at(),
            timezone: None,
        }
    }
}

impl ScheduleConfig {
    pub fn at_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.at.trim(), "%H:%M").map_err(|err| {
            ConfigError::Invalid(format!("schedule.at `{}` is not HH:MM ({err})", self.at))
        })
    }

    pub fn zone(&self) -> Result<ScheduleZone, ConfigError> {
        ScheduleZone::parse(self.timezone.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    pub chatlog_api_base: String,
    pub deepseek_base_url: String,
    pub deepseek_model: String,
    pub talkers: Vec<String>,
    pub deepseek_config: CompletionParams,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_probe_before_batch")]
    pub probe_before_batch: bool,
}

fn default_probe_before_batch() -> bool {
    true
}

impl DigestConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub deepseek_api_key: String,
    pub feishu_webhook: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("deepseek_api_key", &"<redacted>")
            .field("feishu_webhook", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| -> Result<String, ConfigError> {
            match lookup(var) {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(ConfigError::MissingCredential(var)),
            }
        };
        Ok(Self {
            deepseek_api_key: required(DEEPSEEK_API_KEY_VAR)?,
            feishu_webhook: required(FEISHU_WEBHOOK_VAR)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: DigestConfig,
    pub credentials: Credentials,
}

fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "on" => Some(true),
        "0" | "false" | "FALSE" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

fn parse_config(path: &Path, raw: &str) -> Result<DigestConfig, ConfigError> {
    let malformed = |message: String| ConfigError::Malformed {
        path: path.to_path_buf(),
        message,
    };
    if is_toml(path) {
        toml::from_str(raw).map_err(|err| malformed(err.to_string()))
    } else {
        json5::from_str(raw).map_err(|err| malformed(err.to_string()))
    }
}

fn apply_env_overrides(cfg: &mut DigestConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(at) = lookup("DIGEST_SCHEDULE_AT") {
        cfg.schedule.at = at;
    }
    if let Some(tz) = lookup("DIGEST_TIMEZONE") {
        cfg.schedule.timezone = Some(tz);
    }
    if let Some(secs) = lookup("DIGEST_REQUEST_TIMEOUT_SECS")
        && let Ok(parsed) = secs.parse::<u64>()
    {
        cfg.request_timeout_secs = Some(parsed);
    }
    if let Some(flag) = lookup("DIGEST_PROBE").as_deref().and_then(parse_bool) {
        cfg.probe_before_batch = flag;
    }
}

fn validate(cfg: &DigestConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

    if cfg.chatlog_api_base.trim().is_empty() {
        return invalid("chatlog_api_base cannot be empty");
    }
    if cfg.deepseek_base_url.trim().is_empty() {
        return invalid("deepseek_base_url cannot be empty");
    }
    if cfg.deepseek_model.trim().is_empty() {
        return invalid("deepseek_model cannot be empty");
    }
    if cfg.talkers.is_empty() {
        return invalid("talkers must list at least one group");
    }
    if cfg.talkers.iter().any(|t| t.trim().is_empty()) {
        return invalid("talkers cannot contain blank group names");
    }
    let temperature = cfg.deepseek_config.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        return invalid("deepseek_config.temperature must be within 0.0..=2.0");
    }
    if cfg.deepseek_config.max_tokens == 0 {
        return invalid("deepseek_config.max_tokens must be >= 1");
    }
    if cfg.request_timeout_secs == Some(0) {
        return invalid("request_timeout_secs must be >= 1 when set");
    }
    cfg.schedule.at_time()?;
    cfg.schedule.zone()?;
    Ok(())
}

/// Pick the config file: explicit flag, then `DIGEST_CONFIG_PATH`, then
/// `./config.json`, then `<digest home>/config.json`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(custom) = env_non_empty("DIGEST_CONFIG_PATH") {
        return Ok(PathBuf::from(custom));
    }

    let local = PathBuf::from("config.json");
    if local.exists() {
        return Ok(local);
    }
    if let Ok(paths) = resolve_paths()
        && paths.home_config_file.exists()
    {
        return Ok(paths.home_config_file);
    }
    Ok(local)
}

/// Load and validate the file settings without requiring credentials.
pub fn load_file_config(explicit: Option<&Path>) -> Result<(PathBuf, DigestConfig), ConfigError> {
    let path = resolve_config_path(explicit)?;
    if !path.exists() {
        return Err(ConfigError::NotFound(path));
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let mut cfg = parse_config(&path, &raw)?;
    apply_env_overrides(&mut cfg, env_non_empty);
    validate(&cfg)?;
    Ok((path, cfg))
}

pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let (path, config) = load_file_config(explicit)?;
    let credentials = Credentials::from_env()?;
    Ok(LoadedConfig {
        path,
        config,
        credentials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE_JSON: &str = r#"{
        // comments are fine, the file is read as json5
        "chatlog_api_base": "http://127.0.0.1:5030/api/v1/chatlog",
        "deepseek_base_url": "https://api.deepseek.com",
        "deepseek_model": "deepseek-chat",
        "talkers": ["family", "工作群"],
        "deepseek_config": {"temperature": 0.7, "max_tokens": 2000},
    }"#;

    fn sample() -> DigestConfig {
        parse_config(Path::new("config.json"), SAMPLE_JSON).expect("parse sample")
    }

    #[test]
    fn parse_json_config_applies_defaults() {
        let cfg = sample();
        assert_eq!(cfg.talkers, vec!["family".to_string(), "工作群".to_string()]);
        assert_eq!(cfg.deepseek_config.max_tokens, 2000);
        assert_eq!(cfg.schedule.at, "18:00");
        assert!(cfg.schedule.timezone.is_none());
        assert!(cfg.request_timeout_secs.is_none());
        assert!(cfg.probe_before_batch);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn parse_toml_config_by_extension() {
        let raw = r#"
chatlog_api_base = "http://localhost/api"
deepseek_base_url = "https://api.deepseek.com"
deepseek_model = "deepseek-chat"
talkers = ["family"]
request_timeout_secs = 60

[deepseek_config]
temperature = 0.3
max_tokens = 512

[schedule]
at = "07:30"
timezone = "Asia/Shanghai"
"#;
        let cfg = parse_config(Path::new("digest.toml"), raw).expect("parse toml");
        assert_eq!(cfg.schedule.at, "07:30");
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(60)));
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn missing_required_key_is_malformed() {
        let raw = r#"{"chatlog_api_base": "http://x", "deepseek_base_url": "http://y"}"#;
        let err = parse_config(Path::new("config.json"), raw).expect_err("must fail");
        match err {
            ConfigError::Malformed { message, .. } => assert!(message.contains("deepseek_model")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_rejects_empty_talkers() {
        let mut cfg = sample();
        cfg.talkers.clear();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_blank_talker() {
        let mut cfg = sample();
        cfg.talkers.push("  ".to_string());
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_bad_schedule_and_timezone() {
        let mut cfg = sample();
        cfg.schedule.at = "25:99".to_string();
        assert!(validate(&cfg).is_err());

        let mut cfg = sample();
        cfg.schedule.timezone = Some("Mars/Olympus".to_string());
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let mut cfg = sample();
        cfg.deepseek_config.temperature = 3.5;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn env_overrides_replace_schedule_and_probe() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DIGEST_SCHEDULE_AT", "09:15"),
            ("DIGEST_TIMEZONE", "Europe/Berlin"),
            ("DIGEST_REQUEST_TIMEOUT_SECS", "120"),
            ("DIGEST_PROBE", "off"),
        ]);
        let mut cfg = sample();
        apply_env_overrides(&mut cfg, |k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.schedule.at, "09:15");
        assert_eq!(cfg.schedule.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(cfg.request_timeout_secs, Some(120));
        assert!(!cfg.probe_before_batch);
    }

    #[test]
    fn credentials_require_both_values() {
        let only_key: HashMap<&str, &str> = HashMap::from([(DEEPSEEK_API_KEY_VAR, "sk-1")]);
        let err = Credentials::from_lookup(|k| only_key.get(k).map(|v| v.to_string()))
            .expect_err("webhook missing");
        assert!(matches!(err, ConfigError::MissingCredential(FEISHU_WEBHOOK_VAR)));

        let blank_key: HashMap<&str, &str> =
            HashMap::from([(DEEPSEEK_API_KEY_VAR, "  "), (FEISHU_WEBHOOK_VAR, "http://hook")]);
        let err = Credentials::from_lookup(|k| blank_key.get(k).map(|v| v.to_string()))
            .expect_err("blank key");
        assert!(matches!(err, ConfigError::MissingCredential(DEEPSEEK_API_KEY_VAR)));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials {
            deepseek_api_key: "sk-secret".to_string(),
            feishu_webhook: "https://hook/secret".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret"));
    }
}
