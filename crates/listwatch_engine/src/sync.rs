//! The incremental check: walk the months since the checkpoint, report what
//! is newer, then move the checkpoint.

use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use listwatch_core::{
    enumerate, paginate, Checkpoint, Chunk, DateParser, Formatting, LocaleHint, ParseFailure,
    Period, RowFormatter, Timestamp,
};
use listwatch_logging::{watch_debug, watch_info, watch_warn};
use tokio::sync::Mutex;

use crate::notify::{Destination, Notifier, NotifyError, TELEGRAM_MAX_MESSAGE_LEN};
use crate::source::{ArchivePageSource, Entry, SourceError};

pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Largest chunk handed to a notifier, in characters. Leaves headroom under
/// the transport limit for markup the transport may add.
pub const MAX_CHUNK_SIZE: usize = TELEGRAM_MAX_MESSAGE_LEN - 196;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Characters per delivered message; kept below the transport limit.
    pub max_chunk_size: usize,
    pub max_row_len: usize,
    pub formatting: Formatting,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
            max_row_len: 512,
            formatting: Formatting::RichText,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("reading {period} failed: {source}")]
    Source {
        period: Period,
        #[source]
        source: SourceError,
    },
    #[error("delivery failed: {0}")]
    Delivery(#[from] NotifyError),
    #[error(transparent)]
    Input(#[from] ParseFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub since: Timestamp,
    pub checkpoint: Timestamp,
    pub periods: usize,
    pub new_entries: usize,
    /// Entries whose date could not be parsed.
    pub skipped: usize,
    pub chunks_sent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReport {
    pub period: Period,
    pub entries: usize,
    pub skipped: usize,
    pub chunks_sent: usize,
}

#[derive(Debug, Default)]
struct PeriodEntries {
    entries: Vec<Entry>,
    skipped: usize,
}

pub struct Synchronizer {
    source: Arc<dyn ArchivePageSource>,
    notifier: Arc<dyn Notifier>,
    parser: DateParser,
    formatter: RowFormatter,
    max_chunk_size: usize,
    clock: Clock,
    /// Held for a whole check cycle, so at most one cycle runs at a time.
    checkpoint: Mutex<Checkpoint>,
}

impl Synchronizer {
    pub fn new(
        source: Arc<dyn ArchivePageSource>,
        notifier: Arc<dyn Notifier>,
        settings: SyncSettings,
    ) -> Self {
        Self::with_clock(source, notifier, settings, Arc::new(Utc::now))
    }

    /// The checkpoint starts at the clock's current time.
    pub fn with_clock(
        source: Arc<dyn ArchivePageSource>,
        notifier: Arc<dyn Notifier>,
        settings: SyncSettings,
        clock: Clock,
    ) -> Self {
        let max_chunk_size = settings.max_chunk_size.min(MAX_CHUNK_SIZE);
        let checkpoint = Mutex::new(Checkpoint::new((*clock)()));
        Self {
            source,
            notifier,
            parser: DateParser::new(),
            formatter: RowFormatter::new(settings.max_row_len, settings.formatting),
            max_chunk_size,
            clock,
            checkpoint,
        }
    }

    pub fn now(&self) -> Timestamp {
        (*self.clock)()
    }

    pub async fn checkpoint(&self) -> Timestamp {
        self.checkpoint.lock().await.at()
    }

    /// Reports entries newer than the checkpoint to `destination`.
    ///
    /// The checkpoint moves to the clock time at the end of the scan. If any
    /// period cannot be read the cycle aborts and the checkpoint stays put.
    pub async fn check_for_updates(
        &self,
        destination: &Destination,
    ) -> Result<CycleReport, SyncError> {
        let mut checkpoint = self.checkpoint.lock().await;
        let since = checkpoint.at();
        let started = self.now();
        watch_info!("Checking for new threads since {}", since.to_rfc2822());

        let mut rows = Vec::new();
        let mut skipped = 0;
        let mut periods = 0;
        for period in enumerate(since, started) {
            periods += 1;
            let read = self.read_period(period).await?;
            skipped += read.skipped;
            for entry in read.entries {
                if !checkpoint.is_unseen(entry.timestamp) {
                    continue;
                }
                watch_info!("Found a thread in {}: {}", period, entry.title);
                rows.push(self.formatter.format(
                    entry.timestamp,
                    &entry.title,
                    entry.url.as_str(),
                ));
            }
        }

        let advanced_to = checkpoint.advance(self.now());
        watch_debug!("Checkpoint moved to {}", advanced_to.to_rfc2822());

        let mut report = CycleReport {
            since,
            checkpoint: advanced_to,
            periods,
            new_entries: rows.len(),
            skipped,
            chunks_sent: 0,
        };
        if rows.is_empty() {
            return Ok(report);
        }

        let header = self
            .formatter
            .header(&format!("New threads since {}", since.to_rfc2822()));
        let chunks = paginate(std::iter::once(header).chain(rows), self.max_chunk_size);
        report.chunks_sent = self.deliver_all(destination, chunks).await?;
        Ok(report)
    }

    /// Sends every entry of `period` to `destination`. Read-only.
    pub async fn list_period(
        &self,
        period: Period,
        destination: &Destination,
    ) -> Result<ListReport, SyncError> {
        let (chunks, read) = self.listing(period).await?;
        let chunks_sent = self.deliver_all(destination, chunks).await?;
        Ok(ListReport {
            period,
            entries: read.entries.len(),
            skipped: read.skipped,
            chunks_sent,
        })
    }

    /// The chunks `list_period` would deliver.
    pub async fn render_period(&self, period: Period) -> Result<Vec<Chunk>, SyncError> {
        Ok(self.listing(period).await?.0)
    }

    /// Overrides the checkpoint from free-text input.
    pub async fn set_checkpoint(&self, raw: &str) -> Result<Timestamp, SyncError> {
        let at = self.parser.parse(raw, LocaleHint::Source)?;
        watch_info!("Setting last check to {}", at.to_rfc2822());
        self.checkpoint.lock().await.reset(at);
        Ok(at)
    }

    /// Sends a short plain-text reply, e.g. a confirmation or a user-facing error.
    pub async fn reply(&self, destination: &Destination, text: &str) -> Result<(), NotifyError> {
        self.notifier
            .deliver(destination, text, Formatting::PlainText)
            .await
    }

    async fn listing(&self, period: Period) -> Result<(Vec<Chunk>, PeriodEntries), SyncError> {
        let read = self.read_period(period).await?;
        let header = self
            .formatter
            .header(&format!("Threads {} {}", period.year(), period.month_name()));
        let rows: Vec<String> = read
            .entries
            .iter()
            .map(|entry| {
                self.formatter
                    .format(entry.timestamp, &entry.title, entry.url.as_str())
            })
            .collect();
        let chunks = paginate(std::iter::once(header).chain(rows), self.max_chunk_size).collect();
        Ok((chunks, read))
    }

    async fn read_period(&self, period: Period) -> Result<PeriodEntries, SyncError> {
        let wrap = |source| SyncError::Source { period, source };
        let dir = self.source.period_url(period).map_err(wrap)?;
        let mut stream = self.source.fetch(period).await.map_err(wrap)?;

        let mut read = PeriodEntries::default();
        while let Some(item) = stream.next().await {
            let raw = item.map_err(wrap)?;
            let timestamp = match self.parser.parse(&raw.raw_date, LocaleHint::Source) {
                Ok(ts) => ts,
                Err(err) => {
                    watch_warn!("Skipping {:?} in {}: {}", raw.title, period, err);
                    read.skipped += 1;
                    continue;
                }
            };
            let url = match dir.join(&raw.link) {
                Ok(url) => url,
                Err(err) => {
                    watch_warn!("Skipping {:?} in {}: bad link {}", raw.title, period, err);
                    read.skipped += 1;
                    continue;
                }
            };
            read.entries.push(Entry {
                timestamp,
                title: raw.title,
                url,
            });
        }
        Ok(read)
    }

    async fn deliver_all(
        &self,
        destination: &Destination,
        chunks: impl IntoIterator<Item = Chunk>,
    ) -> Result<usize, SyncError> {
        let formatting = self.formatter.formatting();
        let mut sent = 0;
        for chunk in chunks {
            self.notifier
                .deliver(destination, &chunk.text(), formatting)
                .await?;
            sent += 1;
        }
        Ok(sent)
    }
}
