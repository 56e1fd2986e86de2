use reqwest::blocking::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("chatlog-digest/", env!("CARGO_PKG_VERSION"));

/// Build the blocking client shared by one stage.
///
/// `None` leaves requests without a deadline, which is how the pipeline
/// runs unless `request_timeout_secs` is configured.
pub fn build_client(timeout: Option<Duration>) -> reqwest::Result<Client> {
    // reqwest's blocking client defaults to a 30s timeout; clear it explicitly.
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}
