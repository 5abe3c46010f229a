//! Reply delivery to chat-facing endpoints.
//!
//! - request shape and outcome types live here.
//! - retry/backoff policy is delegated to `retry`.

mod retry;

pub use retry::RetryPolicy;

use crate::error::DeliveryError;
use crate::textutil::{log_excerpt, truncate_with_suffix_by_chars};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;

/// Path appended to a session endpoint when none is configured.
pub const DEFAULT_REPLY_PATH: &str = "/reply";

/// One finished reply bound for a session's endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub session: String,
    pub endpoint: String,
    pub chat_id: i64,
    pub text: String,
    pub bot_label: String,
}

/// Wire body expected by the reply endpoint.
#[derive(Debug, Serialize)]
struct ReplyPayload<'a> {
    message_id: &'a str,
    reply: &'a str,
    chat_id: i64,
    bot_name: &'a str,
}

/// What happened to one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub delivered: bool,
    /// Attempts made, including the first.
    pub attempts: u32,
}

impl DeliveryOutcome {
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Anything that can hand a reply to the chat side.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn deliver(&self, request: &DeliveryRequest) -> DeliveryOutcome;
}

/// HTTP dispatcher: POSTs JSON with per-attempt timeout and bounded retries.
pub struct HttpDispatcher {
    http: reqwest::Client,
    reply_path: String,
    retry_policy: RetryPolicy,
}

impl HttpDispatcher {
    /// `timeout` bounds each attempt separately.
    pub fn new(timeout: Duration, retry_policy: RetryPolicy, reply_path: &str) -> Self {
        Self {
            http: build_http_client(timeout),
            reply_path: normalize_reply_path(reply_path),
            retry_policy,
        }
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", endpoint.trim_end_matches('/'), self.reply_path)
    }

    async fn post_once(&self, url: &str, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        let payload = ReplyPayload {
            message_id: "",
            reply: &request.text,
            chat_id: request.chat_id,
            bot_name: &request.bot_label,
        };
        let response = self.http.post(url).json(&payload).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Status(
            status.as_u16(),
            truncate_with_suffix_by_chars(body.trim(), 200, "..."),
        ))
    }
}

#[async_trait]
impl ReplySink for HttpDispatcher {
    async fn deliver(&self, request: &DeliveryRequest) -> DeliveryOutcome {
        let url = self.url_for(&request.endpoint);
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.post_once(&url, request).await {
                Ok(()) => {
                    tracing::info!(
                        session = %request.session,
                        chat_id = request.chat_id,
                        attempt,
                        "reply delivered"
                    );
                    return DeliveryOutcome {
                        delivered: true,
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        session = %request.session,
                        error = %err,
                        "delivery attempt {attempt}/{max_attempts} failed"
                    );
                    if !self.retry_policy.should_retry(attempt) {
                        break;
                    }
                    sleep(self.retry_policy.delay_after(attempt)).await;
                }
            }
        }

        tracing::error!(
            session = %request.session,
            attempts = attempt,
            text = %log_excerpt(&request.text, 80),
            "delivery exhausted, dropping reply"
        );
        DeliveryOutcome {
            delivered: false,
            attempts: attempt,
        }
    }
}

/// Build an HTTP client with timeout applied.
fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn normalize_reply_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
