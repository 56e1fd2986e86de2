use crate::digest::http::build_client;
use crate::digest::util::truncate_with_ellipsis;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("webhook returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("webhook request failed")]
    Transport(#[from] reqwest::Error),
}

pub trait Delivery {
    fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Text-message envelope understood by Feishu/Lark custom bots.
pub fn webhook_payload(message: &str) -> Value {
    serde_json::json!({
        "msg_type": "text",
        "content": {
            "text": message
        }
    })
}

pub fn interpret_response(status: StatusCode, body: &str) -> Result<(), DeliveryError> {
    if status == StatusCode::OK {
        return Ok(());
    }
    Err(DeliveryError::Status {
        status: status.as_u16(),
        body: truncate_with_ellipsis(body, MAX_ERROR_BODY_CHARS),
    })
}

pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: &str, timeout: Option<Duration>) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.trim().to_string(),
        })
    }
}

impl Delivery for WebhookClient {
    fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        let payload = webhook_payload(message);
        tracing::debug!(message_chars = message.chars().count(), "posting to webhook");
        let response = self.client.post(&self.url).json(&payload).send()?;
        let status = response.status();
        let body = response.text()?;
        tracing::debug!(status = status.as_u16(), body = %truncate_with_ellipsis(&body, 200), "webhook replied");
        interpret_response(status, &body)
    }
}
