//! Listwatch engine: archive IO, delivery, and the check cycle.
mod decode;
mod engine;
mod fetch;
mod notify;
mod source;
mod sync;
mod types;

pub use decode::{decode_page, DecodedPage};
pub use engine::{handle_command, EngineCommand, EngineHandle, BAD_DATE_REPLY};
pub use fetch::{ArchivePage, FetchError, FetchSettings, PageFetcher, ReqwestFetcher};
pub use notify::{
    Destination, LogNotifier, Notifier, NotifyError, TelegramNotifier, TELEGRAM_MAX_MESSAGE_LEN,
};
pub use source::{
    parse_message_date, parse_thread_index, ArchivePageSource, Entry, EntryStream,
    PipermailSource, RawEntry, SourceError,
};
pub use sync::{
    Clock, CycleReport, ListReport, SyncError, SyncSettings, Synchronizer, MAX_CHUNK_SIZE,
};
pub use types::EngineEvent;
