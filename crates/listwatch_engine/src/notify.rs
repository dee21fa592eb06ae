use std::fmt;
use std::time::Duration;

use listwatch_core::Formatting;
use listwatch_logging::{watch_debug, watch_info};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use url::Url;

/// Hard per-message limit of the Telegram Bot API, in characters.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Where a message is delivered, e.g. a chat id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination(String);

impl Destination {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("message of {len} characters exceeds the {max} character limit")]
    TooLong { len: usize, max: usize },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rejected by the transport: {0}")]
    Rejected(String),
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(
        &self,
        destination: &Destination,
        text: &str,
        formatting: Formatting,
    ) -> Result<(), NotifyError>;
}

/// Writes every message to the log instead of sending it anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn deliver(
        &self,
        destination: &Destination,
        text: &str,
        _formatting: Formatting,
    ) -> Result<(), NotifyError> {
        watch_info!("[to {}]\n{}", destination, text);
        Ok(())
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let endpoint = Url::parse(api_base)
            .and_then(|base| base.join(&format!("/bot{}/sendMessage", token.trim())))
            .map_err(|err| NotifyError::Transport(format!("invalid api url: {err}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(
        &self,
        destination: &Destination,
        text: &str,
        formatting: Formatting,
    ) -> Result<(), NotifyError> {
        let len = text.chars().count();
        if len > TELEGRAM_MAX_MESSAGE_LEN {
            return Err(NotifyError::TooLong {
                len,
                max: TELEGRAM_MAX_MESSAGE_LEN,
            });
        }

        let payload = SendMessage {
            chat_id: destination.as_str(),
            text,
            parse_mode: match formatting {
                Formatting::RichText => Some("HTML"),
                Formatting::PlainText => None,
            },
            disable_web_page_preview: true,
        };
        let body = serde_json::to_vec(&payload)
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        watch_debug!("sendMessage to {} ({} chars)", destination, len);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        let parsed: Option<ApiResponse> = serde_json::from_slice(&bytes).ok();

        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(NotifyError::Rejected(
                api.description.unwrap_or_else(|| status.to_string()),
            )),
            None => Err(NotifyError::Rejected(status.to_string())),
        }
    }
}
