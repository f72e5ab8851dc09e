//! Bot API client used by the polling loop and reply delivery.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::telegram_update::TelegramUpdate;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const TELEGRAM_SAFE_MAX_CHARS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `TelegramApiConfig` used across jailbot components.
pub struct TelegramApiConfig {
    pub api_base: String,
    pub bot_token: String,
    pub request_timeout_ms: u64,
    pub poll_timeout_seconds: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for TelegramApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            bot_token: String::new(),
            request_timeout_ms: 10_000,
            poll_timeout_seconds: 30,
            retry_max_attempts: 3,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `TelegramParseMode` values.
pub enum TelegramParseMode {
    Html,
}

impl TelegramParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "HTML",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One reply addressed to a chat.
pub struct OutboundChatMessage {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: Option<TelegramParseMode>,
    pub force_reply: bool,
}

impl OutboundChatMessage {
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            force_reply: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TelegramResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct TelegramApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<TelegramResponseParameters>,
}

#[derive(Debug, Clone, Deserialize)]
struct TelegramSentMessage {
    message_id: i64,
}

#[derive(Clone)]
/// Public struct `TelegramApiClient` used across jailbot components.
pub struct TelegramApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    poll_timeout_seconds: u64,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl std::fmt::Debug for TelegramApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramApiClient")
            .field("api_base", &self.api_base)
            .field("poll_timeout_seconds", &self.poll_timeout_seconds)
            .finish_non_exhaustive()
    }
}

impl TelegramApiClient {
    pub fn new(config: TelegramApiConfig) -> Result<Self> {
        let bot_token = config.bot_token.trim().to_string();
        if bot_token.is_empty() {
            bail!("telegram bot token cannot be empty");
        }
        let api_base = config.api_base.trim().trim_end_matches('/').to_string();
        if api_base.is_empty() {
            bail!("telegram api base cannot be empty");
        }
        // Long polls hold the request open for the poll timeout.
        let timeout_ms = config
            .request_timeout_ms
            .max(1)
            .saturating_add(config.poll_timeout_seconds.saturating_mul(1_000));
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("jailbot"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to create telegram api client")?;

        Ok(Self {
            http,
            api_base,
            bot_token,
            poll_timeout_seconds: config.poll_timeout_seconds,
            retry_max_attempts: config.retry_max_attempts.max(1),
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<TelegramUpdate>> {
        let mut query = vec![(
            "timeout".to_string(),
            self.poll_timeout_seconds.to_string(),
        )];
        if let Some(offset) = offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        let url = self.method_url("getUpdates");
        self.request_result("getUpdates", || self.http.get(url.as_str()).query(&query))
            .await
    }

    /// Sends `message`, splitting text longer than the Bot API limit into
    /// sequential chunks. Returns the provider message ids in order.
    pub async fn send_message(&self, message: &OutboundChatMessage) -> Result<Vec<i64>> {
        let chunks = chunk_text(&message.text, TELEGRAM_SAFE_MAX_CHARS);
        let url = self.method_url("sendMessage");
        let mut message_ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let payload = build_send_message_payload(message, &chunk);
            let sent: TelegramSentMessage = self
                .request_result("sendMessage", || self.http.post(url.as_str()).json(&payload))
                .await?;
            message_ids.push(sent.message_id);
        }
        Ok(message_ids)
    }

    async fn request_result<T, F>(&self, operation: &str, mut builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = match builder().send().await {
                Ok(response) => response,
                Err(error) => {
                    if attempt < self.retry_max_attempts && is_retryable_transport_error(&error) {
                        tracing::warn!(operation, attempt, %error, "telegram transport error, retrying");
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("telegram api {operation} request failed"));
                }
            };

            let status = response.status();
            let header_retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<TelegramApiResponse<T>>(&body);
            if status.is_success() {
                let parsed = parsed
                    .with_context(|| format!("failed to decode telegram {operation} response"))?;
                if !parsed.ok {
                    bail!(
                        "telegram api {operation} failed: {}",
                        parsed
                            .description
                            .unwrap_or_else(|| "unknown error".to_string())
                    );
                }
                return parsed
                    .result
                    .ok_or_else(|| anyhow!("telegram api {operation} response missing result"));
            }

            let body_retry_after = parsed
                .as_ref()
                .ok()
                .and_then(|parsed| parsed.parameters.as_ref())
                .and_then(|parameters| parameters.retry_after)
                .map(Duration::from_secs);
            if attempt < self.retry_max_attempts && is_retryable_telegram_status(status.as_u16()) {
                tracing::warn!(
                    operation,
                    attempt,
                    status = status.as_u16(),
                    "telegram api throttled or unavailable, retrying"
                );
                tokio::time::sleep(retry_delay(
                    self.retry_base_delay_ms,
                    attempt,
                    header_retry_after.or(body_retry_after),
                ))
                .await;
                continue;
            }

            bail!(
                "telegram api {operation} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
    }
}

fn build_send_message_payload(message: &OutboundChatMessage, chunk: &str) -> Value {
    let mut payload = json!({
        "chat_id": message.chat_id,
        "text": chunk,
        "disable_web_page_preview": true,
    });
    if let Some(parse_mode) = message.parse_mode {
        payload["parse_mode"] = Value::String(parse_mode.as_str().to_string());
    }
    if message.force_reply {
        payload["reply_markup"] = json!({ "force_reply": true, "selective": true });
    }
    payload
}

pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for ch in text.chars() {
        current.push(ch);
        current_len = current_len.saturating_add(1);
        if current_len >= max_chars {
            chunks.push(current);
            current = String::new();
            current_len = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let raw = headers.get("retry-after")?.to_str().ok()?;
    let seconds = raw.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds))
}

fn retry_delay(base_delay_ms: u64, attempt: usize, retry_after: Option<Duration>) -> Duration {
    if let Some(delay) = retry_after {
        return delay.max(Duration::from_millis(base_delay_ms));
    }
    let exponent = attempt.saturating_sub(1).min(10) as u32;
    let scaled = base_delay_ms.saturating_mul(2_u64.saturating_pow(exponent));
    Duration::from_millis(scaled.min(30_000))
}

fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

fn is_retryable_telegram_status(status: u16) -> bool {
    status == 429 || status >= 500
}

fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
