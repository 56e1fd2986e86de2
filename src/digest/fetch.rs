use crate::digest::content::LogContent;
use crate::digest::http::build_client;
use crate::digest::util::truncate_with_ellipsis;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

/// Characters left unescaped in the `talker` query value: RFC 3986
/// unreserved characters plus `/`.
const TALKER_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("chat log service returned an empty body")]
    EmptyBody,
    #[error("chat log service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("chat log request failed")]
    Transport(#[from] reqwest::Error),
}

/// Source of one group's log for one day.
pub trait LogSource {
    fn fetch(&self, group: &str, date: &str) -> Result<LogContent, FetchError>;
}

pub fn encode_group(group: &str) -> String {
    utf8_percent_encode(group, TALKER_ENCODE_SET).to_string()
}

pub fn chatlog_url(base: &str, date: &str, group: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{base}{separator}time={date}&talker={}",
        encode_group(group)
    )
}

/// Map a finished exchange onto the fetch contract: only a 200 with a
/// non-blank body yields content.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<LogContent, FetchError> {
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            status: status.as_u16(),
            body: truncate_with_ellipsis(body, MAX_ERROR_BODY_CHARS),
        });
    }
    if body.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }
    Ok(LogContent::from_body(body))
}

pub struct ChatlogClient {
    client: Client,
    base: String,
}

impl ChatlogClient {
    pub fn new(base: &str, timeout: Option<Duration>) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base: base.trim().to_string(),
        })
    }
}

impl LogSource for ChatlogClient {
    fn fetch(&self, group: &str, date: &str) -> Result<LogContent, FetchError> {
        let url = chatlog_url(&self.base, date, group);
        tracing::debug!(%url, "requesting chat log");
        let response = self.client.get(&url).send()?;
        let status = response.status();
        let body = response.text()?;
        interpret_response(status, &body)
    }
}
