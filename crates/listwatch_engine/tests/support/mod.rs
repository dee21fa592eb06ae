#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use futures_util::stream::{self, StreamExt};
use listwatch_core::{Formatting, Period, Timestamp};
use listwatch_engine::{
    ArchivePageSource, Clock, Destination, EntryStream, FetchError, Notifier, NotifyError,
    RawEntry, SourceError,
};
use url::Url;

pub const ARCHIVE: &str = "http://archive.test/pycon/";

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn entry(title: &str, raw_date: &str, link: &str) -> RawEntry {
    RawEntry {
        title: title.to_string(),
        raw_date: raw_date.to_string(),
        link: link.to_string(),
    }
}

/// Archive held in memory; counts how often each period is read.
#[derive(Default)]
pub struct MemorySource {
    periods: Mutex<HashMap<Period, Vec<RawEntry>>>,
    failing: Mutex<HashSet<Period>>,
    reads: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, period: Period, entries: Vec<RawEntry>) {
        self.periods.lock().unwrap().insert(period, entries);
    }

    pub fn fail(&self, period: Period) {
        self.failing.lock().unwrap().insert(period);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ArchivePageSource for MemorySource {
    fn period_url(&self, period: Period) -> Result<Url, SourceError> {
        Ok(Url::parse(ARCHIVE)?.join(&format!("{}/", period.archive_segment()))?)
    }

    async fn fetch(&self, period: Period) -> Result<EntryStream, SourceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&period) {
            return Err(SourceError::Fetch {
                url: self.period_url(period)?.to_string(),
                source: FetchError::Status(500),
            });
        }
        let entries = self
            .periods
            .lock()
            .unwrap()
            .get(&period)
            .cloned()
            .unwrap_or_default();
        Ok(stream::iter(entries.into_iter().map(Ok::<_, SourceError>)).boxed())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub destination: Destination,
    pub text: String,
    pub formatting: Formatting,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Delivered>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<Delivered> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|d| d.text).collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(
        &self,
        destination: &Destination,
        text: &str,
        formatting: Formatting,
    ) -> Result<(), NotifyError> {
        if *self.failing.lock().unwrap() {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(Delivered {
            destination: destination.clone(),
            text: text.to_string(),
            formatting,
        });
        Ok(())
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    secs: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn at(ts: Timestamp) -> Self {
        Self {
            secs: Arc::new(AtomicI64::new(ts.timestamp())),
        }
    }

    pub fn set(&self, ts: Timestamp) {
        self.secs.store(ts.timestamp(), Ordering::SeqCst);
    }

    pub fn clock(&self) -> Clock {
        let secs = self.secs.clone();
        Arc::new(move || {
            Utc.timestamp_opt(secs.load(Ordering::SeqCst), 0)
                .single()
                .unwrap()
        })
    }
}
