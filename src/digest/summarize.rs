use crate::digest::config::CompletionParams;
use crate::digest::http::build_client;
use crate::digest::util::truncate_with_ellipsis;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Markdown markers that render as noise in the target chat.
const STRIPPED_MARKERS: [&str; 2] = ["**", "###"];

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("chat completion returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("chat completion response malformed: {0}")]
    MalformedResponse(String),
    #[error("chat completion returned an empty summary")]
    EmptySummary,
    #[error("chat completion request failed")]
    Transport(#[from] reqwest::Error),
}

pub trait Summarizer {
    fn summarize(&self, prompt: &str) -> Result<String, SummarizeError>;
}

pub fn completions_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    format!("{base}/v1/chat/completions")
}

pub fn completion_payload(model: &str, prompt: &str, params: &CompletionParams) -> Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {"role": "user", "content": prompt}
        ],
        "temperature": params.temperature,
        "max_tokens": params.max_tokens
    })
}

fn extract_message_content(json: &Value) -> Option<String> {
    let choices = json.get("choices").and_then(Value::as_array)?;
    let first = choices.first()?;
    first
        .get("message")?
        .get("content")?
        .as_str()
        .map(ToOwned::to_owned)
}

/// Remove every `**` and `###`. Repeats until stable because removing one
/// marker can join its neighbours into another (`*###*`).
pub fn strip_markdown_markers(text: &str) -> String {
    let mut out = text.to_string();
    while STRIPPED_MARKERS.iter().any(|m| out.contains(m)) {
        for marker in STRIPPED_MARKERS {
            out = out.replace(marker, "");
        }
    }
    out
}

pub fn interpret_response(status: StatusCode, body: &str) -> Result<String, SummarizeError> {
    if status != StatusCode::OK {
        return Err(SummarizeError::Status {
            status: status.as_u16(),
            body: truncate_with_ellipsis(body, MAX_ERROR_BODY_CHARS),
        });
    }
    let json: Value = serde_json::from_str(body).map_err(|err| {
        SummarizeError::MalformedResponse(format!(
            "invalid json ({err}): {}",
            truncate_with_ellipsis(body, MAX_ERROR_BODY_CHARS)
        ))
    })?;
    let content = extract_message_content(&json).ok_or_else(|| {
        SummarizeError::MalformedResponse("missing choices[0].message.content".to_string())
    })?;
    let cleaned = strip_markdown_markers(&content);
    if cleaned.trim().is_empty() {
        return Err(SummarizeError::EmptySummary);
    }
    Ok(cleaned)
}

/// OpenAI-compatible chat completion endpoint (DeepSeek by default).
pub struct ChatCompletionClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    params: CompletionParams,
}

impl ChatCompletionClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        params: CompletionParams,
        timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: completions_url(base_url),
            api_key: api_key.to_string(),
            model: model.to_string(),
            params,
        })
    }
}

impl Summarizer for ChatCompletionClient {
    fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let payload = completion_payload(&self.model, prompt, &self.params);
        tracing::debug!(
            url = %self.url,
            prompt_chars = prompt.chars().count(),
            "calling chat completion"
        );
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        interpret_response(status, &body)
    }
}
