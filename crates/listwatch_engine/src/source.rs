use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt};
use listwatch_core::{Period, Timestamp};
use listwatch_logging::{watch_info, watch_trace, watch_warn};
use scraper::{ElementRef, Html};
use url::Url;

use crate::fetch::{FetchError, PageFetcher};

/// One item of a period's index, before its date is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub raw_date: String,
    /// Relative to the period's directory.
    pub link: String,
}

/// An entry whose date parsed, with its link resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub timestamp: Timestamp,
    pub title: String,
    pub url: Url,
}

/// Entries of one period in chronological order. Single pass.
pub type EntryStream = BoxStream<'static, Result<RawEntry, SourceError>>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("unexpected page layout at {url}: {reason}")]
    Layout { url: String, reason: String },
    #[error("invalid archive url: {0}")]
    Url(#[from] url::ParseError),
}

#[async_trait::async_trait]
pub trait ArchivePageSource: Send + Sync {
    /// Directory of `period`; entry links resolve against it.
    fn period_url(&self, period: Period) -> Result<Url, SourceError>;

    /// Entries of `period`. A period without a page yields an empty stream.
    async fn fetch(&self, period: Period) -> Result<EntryStream, SourceError>;
}

/// Reads a pipermail archive laid out as `<base>/{year}-{Month}/thread.html`.
pub struct PipermailSource {
    base: Url,
    fetcher: Arc<dyn PageFetcher>,
}

impl PipermailSource {
    pub fn new(base_url: &str, fetcher: Arc<dyn PageFetcher>) -> Result<Self, SourceError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base, fetcher })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

#[async_trait::async_trait]
impl ArchivePageSource for PipermailSource {
    fn period_url(&self, period: Period) -> Result<Url, SourceError> {
        Ok(self.base.join(&format!("{}/", period.archive_segment()))?)
    }

    async fn fetch(&self, period: Period) -> Result<EntryStream, SourceError> {
        let dir = self.period_url(period)?;
        let index_url = dir.join("thread.html")?;
        watch_info!("Reading page {}", index_url);

        let page = match self.fetcher.fetch_page(&index_url).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                watch_info!("No archive page for {} yet", period);
                return Ok(stream::empty().boxed());
            }
            Err(source) => {
                return Err(SourceError::Fetch {
                    url: index_url.to_string(),
                    source,
                });
            }
        };
        let threads = parse_thread_index(&page.html).map_err(|reason| SourceError::Layout {
            url: index_url.to_string(),
            reason: reason.to_string(),
        })?;

        let fetcher = self.fetcher.clone();
        let entries = stream::iter(threads).then(move |(title, link)| {
            let fetcher = fetcher.clone();
            let dir = dir.clone();
            async move {
                let url = dir.join(&link)?;
                watch_trace!("Reading message {}", url);
                let page = fetcher
                    .fetch_page(&url)
                    .await
                    .map_err(|source| SourceError::Fetch {
                        url: url.to_string(),
                        source,
                    })?;
                // A vanished message leaves an empty date; the entry is skipped later.
                let raw_date = page
                    .and_then(|page| parse_message_date(&page.html))
                    .unwrap_or_else(|| {
                        watch_warn!("No date found in {}", url);
                        String::new()
                    });
                Ok::<_, SourceError>(RawEntry {
                    title,
                    raw_date,
                    link,
                })
            }
        });
        Ok(entries.boxed())
    }
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name().eq_ignore_ascii_case(name))
}

fn body(doc: &Html) -> Option<ElementRef<'_>> {
    child_elements(doc.root_element(), "body").next()
}

/// `(title, link)` of each thread root: the top-level items of the second
/// top-level list in the body (the first one holds the sort links).
pub fn parse_thread_index(html: &str) -> Result<Vec<(String, String)>, &'static str> {
    let doc = Html::parse_document(html);
    let body = body(&doc).ok_or("missing <body>")?;
    let list = child_elements(body, "ul")
        .nth(1)
        .ok_or("missing thread list")?;

    let threads = child_elements(list, "li")
        .filter_map(|item| {
            let anchor = child_elements(item, "a").next()?;
            let href = anchor.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let title = anchor
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            Some((title, href.to_string()))
        })
        .collect();
    Ok(threads)
}

/// Footer date of a message page: the first `<i>` in the body.
pub fn parse_message_date(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let body = body(&doc)?;
    body.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name().eq_ignore_ascii_case("i"))
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}
