use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use listwatch_core::Formatting;
use listwatch_engine::{FetchSettings, SyncSettings, MAX_CHUNK_SIZE};
use listwatch_logging::{watch_info, watch_warn, LogDestination};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "./listwatch.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowStyle {
    PlainText,
    #[default]
    RichText,
}

impl From<RowStyle> for Formatting {
    fn from(style: RowStyle) -> Self {
        match style {
            RowStyle::PlainText => Formatting::PlainText,
            RowStyle::RichText => Formatting::RichText,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOutput {
    File,
    #[default]
    Terminal,
    Both,
}

impl From<LogOutput> for LogDestination {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::File => LogDestination::File,
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub archive_base_url: String,
    pub check_interval_secs: u64,
    pub max_chunk_size: usize,
    pub max_row_len: usize,
    pub formatting: RowStyle,
    /// Chat that receives scheduled reports and command replies.
    pub destination: Option<String>,
    /// File holding the bot token. Without it messages only go to the log.
    pub telegram_token_file: Option<PathBuf>,
    pub telegram_api_base: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_destination: LogOutput,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            archive_base_url: "http://lists.python.it/pipermail/pycon/".to_string(),
            check_interval_secs: 120,
            max_chunk_size: MAX_CHUNK_SIZE,
            max_row_len: 512,
            formatting: RowStyle::RichText,
            destination: None,
            telegram_token_file: None,
            telegram_api_base: "https://api.telegram.org".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            log_destination: LogOutput::Terminal,
            verbose: false,
        }
    }
}

impl AppConfig {
    /// Reads a RON config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Logs what [`load`](Self::load) resolved; call once logging is up.
    pub fn log_summary(&self, path: &Path) {
        watch_info!(
            "Config {:?}: archive {}, every {}s",
            path,
            self.archive_base_url,
            self.check_interval_secs
        );
        if self.max_chunk_size > MAX_CHUNK_SIZE {
            watch_warn!(
                "max_chunk_size {} exceeds {}; clamping",
                self.max_chunk_size,
                MAX_CHUNK_SIZE
            );
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            max_chunk_size: self.max_chunk_size.min(MAX_CHUNK_SIZE),
            max_row_len: self.max_row_len,
            formatting: self.formatting.into(),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FetchSettings::default()
        }
    }
}
