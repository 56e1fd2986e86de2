use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DigestPaths {
    pub digest_home: PathBuf,
    pub logs_dir: PathBuf,
    pub home_config_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<DigestPaths> {
    let digest_home = match env::var("DIGEST_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join(".chatlog-digest"),
    };

    // Resolved against the working directory.
    let logs_dir = env_or_default_path("DIGEST_LOGS_DIR", PathBuf::from("logs"));
    let home_config_file = digest_home.join("config.json");

    Ok(DigestPaths {
        digest_home,
        logs_dir,
        home_config_file,
    })
}
