use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use listwatch_core::{Locale, Period};
use listwatch_logging::{watch_error, watch_info, watch_warn};

use crate::notify::Destination;
use crate::sync::{SyncError, Synchronizer};
use crate::EngineEvent;

/// Reply to an unparseable checkpoint date.
pub const BAD_DATE_REPLY: &str = "Send a date in unambiguous format (e.g. yyyy-mm-dd)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    CheckForUpdates { destination: Destination },
    /// `args` are resolved with [`Period::resolve`].
    ListPeriod {
        args: Vec<String>,
        destination: Destination,
    },
    SetCheckpoint {
        text: String,
        destination: Destination,
    },
}

/// Runs commands on a worker thread with its own tokio runtime.
///
/// Every command is spawned as a separate task, so a slow listing never
/// delays a scheduled check; checks still run one at a time because the
/// synchronizer holds the checkpoint for a whole cycle.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(sync: Arc<Synchronizer>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::Builder::new()
            .name("listwatch-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let sync = sync.clone();
                    let event_tx = event_tx.clone();
                    runtime.spawn(async move {
                        let event = handle_command(&sync, command).await;
                        let _ = event_tx.send(event);
                    });
                }
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    /// A sender for other threads, e.g. a scheduler.
    pub fn sender(&self) -> mpsc::Sender<EngineCommand> {
        self.cmd_tx.clone()
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

pub async fn handle_command(sync: &Synchronizer, command: EngineCommand) -> EngineEvent {
    match command {
        EngineCommand::CheckForUpdates { destination } => {
            let result = sync.check_for_updates(&destination).await;
            match &result {
                Ok(report) => watch_info!(
                    "Check done: {} new, {} skipped, checkpoint {}",
                    report.new_entries,
                    report.skipped,
                    report.checkpoint.to_rfc2822()
                ),
                // Not reported to users; the next tick retries.
                Err(err) => watch_error!("Check for updates failed: {}", err),
            }
            EngineEvent::CycleCompleted(result.map_err(|err| err.to_string()))
        }
        EngineCommand::ListPeriod { args, destination } => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let period = match Period::resolve(&args, sync.now(), &Locale::italian()) {
                Ok(period) => period,
                Err(err) => {
                    send_reply(sync, &destination, &format!("Unknown period: {err}")).await;
                    return EngineEvent::ListCompleted(Err(err.to_string()));
                }
            };
            let result = sync.list_period(period, &destination).await;
            if let Err(err) = &result {
                watch_error!("Listing {} failed: {}", period, err);
                if matches!(err, SyncError::Source { .. }) {
                    let text = format!("Could not read the archive for {period}");
                    send_reply(sync, &destination, &text).await;
                }
            }
            EngineEvent::ListCompleted(result.map_err(|err| err.to_string()))
        }
        EngineCommand::SetCheckpoint { text, destination } => {
            let result = sync.set_checkpoint(&text).await;
            let reply = match &result {
                Ok(at) => format!("Setting last check: {}", at.to_rfc2822()),
                Err(err) => {
                    watch_warn!("Rejected checkpoint input {:?}: {}", text, err);
                    BAD_DATE_REPLY.to_string()
                }
            };
            send_reply(sync, &destination, &reply).await;
            EngineEvent::CheckpointSet(result.map_err(|err| err.to_string()))
        }
    }
}

async fn send_reply(sync: &Synchronizer, destination: &Destination, text: &str) {
    if let Err(err) = sync.reply(destination, text).await {
        watch_error!("Reply to {} failed: {}", destination, err);
    }
}
