use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "chatlog_digest=info";
const LOG_FILE_PREFIX: &str = "chatlog_digest_";
const LOG_FILE_SUFFIX: &str = ".log";

pub fn log_file_name(day: &str) -> String {
    format!("{LOG_FILE_PREFIX}{day}{LOG_FILE_SUFFIX}")
}

/// Install the process subscriber: stderr plus an append-only file named
/// after today's date inside `logs_dir`. Returns the file path.
pub fn init(logs_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;
    let path = logs_dir.join(log_file_name(&Local::now().format("%Y%m%d").to_string()));
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(path)
}

fn is_log_file(name: &str) -> bool {
    name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX)
}

/// Newest log file by name; names embed the date so lexical order is
/// chronological.
pub fn latest_log_file(logs_dir: &Path) -> Result<Option<PathBuf>> {
    if !logs_dir.exists() {
        return Ok(None);
    }
    let mut candidates = Vec::new();
    for entry in fs::read_dir(logs_dir)
        .with_context(|| format!("failed to read {}", logs_dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_log_file(&name) && entry.path().is_file() {
            candidates.push(name);
        }
    }
    candidates.sort();
    Ok(candidates.pop().map(|name| logs_dir.join(name)))
}

pub fn tail_lines(path: &Path, count: usize) -> Result<Vec<String>> {
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        lines.push(line.with_context(|| format!("failed to read {}", path.display()))?);
    }
    let skip = lines.len().saturating_sub(count);
    Ok(lines.split_off(skip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn latest_log_file_picks_newest_date() {
        let tmp = tempdir().expect("tempdir");
        for day in ["20240101", "20240315", "20231231"] {
            fs::write(tmp.path().join(log_file_name(day)), "x\n").expect("write log");
        }
        fs::write(tmp.path().join("notes.txt"), "ignored").expect("write other");

        let latest = latest_log_file(tmp.path()).expect("scan").expect("some file");
        assert_eq!(latest, tmp.path().join("chatlog_digest_20240315.log"));
    }

    #[test]
    fn latest_log_file_handles_missing_dir() {
        let tmp = tempdir().expect("tempdir");
        let missing = tmp.path().join("nope");
        assert!(latest_log_file(&missing).expect("scan").is_none());
    }

    #[test]
    fn tail_lines_returns_last_lines() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join(log_file_name("20240101"));
        fs::write(&path, "one\ntwo\nthree\nfour\n").expect("write log");

        assert_eq!(tail_lines(&path, 2).expect("tail"), vec!["three", "four"]);
        assert_eq!(tail_lines(&path, 10).expect("tail").len(), 4);
    }
}
