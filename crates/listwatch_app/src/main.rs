mod commands;
mod config;

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use listwatch_engine::{
    Destination, EngineCommand, EngineEvent, EngineHandle, LogNotifier, Notifier, PageFetcher,
    PipermailSource, ReqwestFetcher, Synchronizer, TelegramNotifier,
};
use listwatch_logging::{watch_debug, watch_info, watch_warn};
use log::LevelFilter;

use commands::{parse_line, Input, HELP};
use config::{AppConfig, DEFAULT_CONFIG_PATH};

/// Destination used when messages only go to the log.
const CONSOLE_DESTINATION: &str = "console";

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load(&config_path)?;

    let level = if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    listwatch_logging::initialize(config.log_destination.into(), level);
    config.log_summary(&config_path);

    let (notifier, destination) = build_notifier(&config)?;
    let fetcher: Arc<dyn PageFetcher> = Arc::new(ReqwestFetcher::new(config.fetch_settings())?);
    let source = PipermailSource::new(&config.archive_base_url, fetcher)
        .with_context(|| format!("invalid archive_base_url {:?}", config.archive_base_url))?;
    let sync = Arc::new(Synchronizer::new(
        Arc::new(source),
        notifier,
        config.sync_settings(),
    ));
    watch_info!(
        "Reporting to {} threads newer than {}",
        destination,
        sync.now().to_rfc2822()
    );

    let engine = EngineHandle::new(sync).context("could not start the engine")?;
    let running = Arc::new(AtomicBool::new(true));
    spawn_scheduler(engine.sender(), destination.clone(), config.check_interval())?;
    spawn_console(engine.sender(), destination, running.clone())?;

    while running.load(Ordering::Relaxed) {
        match engine.try_recv() {
            Some(event) => log_event(&event),
            None => thread::sleep(Duration::from_millis(50)),
        }
    }
    watch_info!("Stopping");
    Ok(())
}

fn build_notifier(config: &AppConfig) -> anyhow::Result<(Arc<dyn Notifier>, Destination)> {
    let Some(token_file) = &config.telegram_token_file else {
        let destination = config.destination.as_deref().unwrap_or(CONSOLE_DESTINATION);
        watch_warn!("No telegram_token_file configured; messages go to the log only");
        return Ok((Arc::new(LogNotifier), Destination::new(destination)));
    };
    let Some(destination) = &config.destination else {
        bail!("telegram_token_file is set but no destination chat is configured");
    };

    let token = fs::read_to_string(token_file)
        .with_context(|| format!("could not read token file {token_file:?}"))?;
    let notifier = TelegramNotifier::new(
        &config.telegram_api_base,
        token.trim(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    Ok((Arc::new(notifier), Destination::new(destination.as_str())))
}

/// Sends a check every `interval`; ticks are never queued up.
fn spawn_scheduler(
    commands: mpsc::Sender<EngineCommand>,
    destination: Destination,
    interval: Duration,
) -> io::Result<()> {
    thread::Builder::new()
        .name("listwatch-scheduler".to_string())
        .spawn(move || loop {
            thread::sleep(interval);
            let command = EngineCommand::CheckForUpdates {
                destination: destination.clone(),
            };
            if commands.send(command).is_err() {
                break;
            }
        })?;
    Ok(())
}

fn spawn_console(
    commands: mpsc::Sender<EngineCommand>,
    destination: Destination,
    running: Arc<AtomicBool>,
) -> io::Result<()> {
    thread::Builder::new()
        .name("listwatch-console".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match parse_line(&line, &destination) {
                    Ok(Input::Engine(command)) => {
                        if commands.send(command).is_err() {
                            break;
                        }
                    }
                    Ok(Input::Help) => println!("{HELP}"),
                    Ok(Input::Quit) => {
                        running.store(false, Ordering::Relaxed);
                        break;
                    }
                    Ok(Input::Empty) => {}
                    Err(err) => println!("{err}"),
                }
            }
            // Without a console the scheduler keeps running.
            watch_debug!("Console closed");
        })?;
    Ok(())
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::CycleCompleted(Ok(report)) => watch_debug!(
            "Cycle over {} month(s): {} new, {} message(s)",
            report.periods,
            report.new_entries,
            report.chunks_sent
        ),
        EngineEvent::ListCompleted(Ok(report)) => watch_info!(
            "Listed {}: {} thread(s), {} skipped",
            report.period,
            report.entries,
            report.skipped
        ),
        EngineEvent::CheckpointSet(Ok(at)) => {
            watch_debug!("Checkpoint now {}", at.to_rfc2822())
        }
        EngineEvent::CycleCompleted(Err(err))
        | EngineEvent::ListCompleted(Err(err))
        | EngineEvent::CheckpointSet(Err(err)) => watch_debug!("Command failed: {}", err),
    }
}
