//! HTTP access to the archive.
//!
//! Pages come back decoded. A page the server says is gone (404 or 410) is
//! `Ok(None)`: a month nobody has posted in yet has no directory.

use std::time::Duration;

use listwatch_logging::{watch_debug, watch_trace};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use url::Url;

use crate::decode::decode_page;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Covers the whole exchange, body included.
    pub request_timeout: Duration,
    /// Pipermail indexes of busy months run to a few hundred KiB.
    pub max_bytes: usize,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 4 * 1024 * 1024,
            user_agent: concat!("listwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("not an http(s) url: {0}")]
    UnsupportedUrl(String),
    #[error("server answered {0}")]
    Status(u16),
    #[error("timed out")]
    Timeout,
    #[error("page exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
    #[error("{0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// A decoded archive page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePage {
    /// Where the page was read from, after redirects.
    pub url: Url,
    pub html: String,
    pub encoding: String,
}

#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// `Ok(None)` when the page does not exist.
    async fn fetch_page(&self, url: &Url) -> Result<Option<ArchivePage>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            max_bytes: settings.max_bytes,
        })
    }
}

#[async_trait::async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<Option<ArchivePage>, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedUrl(url.to_string()));
        }

        watch_debug!("GET {}", url);
        let mut response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => return Ok(None),
            status if !status.is_success() => return Err(FetchError::Status(status.as_u16())),
            _ => {}
        }
        let too_large = FetchError::TooLarge {
            max_bytes: self.max_bytes,
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(too_large);
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large);
            }
            body.extend_from_slice(&chunk);
        }

        let decoded = decode_page(&body, content_type.as_deref());
        watch_trace!("{} bytes of {} from {}", body.len(), decoded.encoding_label, final_url);
        Ok(Some(ArchivePage {
            url: final_url,
            html: decoded.html,
            encoding: decoded.encoding_label,
        }))
    }
}
