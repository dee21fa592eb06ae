mod support;

use std::sync::Arc;
use std::time::Duration;

use listwatch_core::Period;
use listwatch_engine::{
    handle_command, Destination, EngineCommand, EngineEvent, EngineHandle, SyncSettings,
    Synchronizer, BAD_DATE_REPLY,
};
use pretty_assertions::assert_eq;

use support::{entry, utc, ManualClock, MemorySource, RecordingNotifier};

fn setup() -> (Arc<MemorySource>, Arc<RecordingNotifier>, Arc<Synchronizer>) {
    listwatch_logging::initialize_for_tests();
    let source = MemorySource::new();
    let notifier = RecordingNotifier::new();
    let clock = ManualClock::at(utc(2015, 3, 25, 9, 0, 0));
    let sync = Synchronizer::with_clock(
        source.clone(),
        notifier.clone(),
        SyncSettings::default(),
        clock.clock(),
    );
    (source, notifier, Arc::new(sync))
}

fn chat() -> Destination {
    Destination::new("7")
}

#[tokio::test]
async fn set_checkpoint_confirms_the_parsed_date() {
    let (_, notifier, sync) = setup();

    let event = handle_command(
        &sync,
        EngineCommand::SetCheckpoint {
            text: "2015-03-10".to_string(),
            destination: chat(),
        },
    )
    .await;

    assert_eq!(event, EngineEvent::CheckpointSet(Ok(utc(2015, 3, 10, 0, 0, 0))));
    assert_eq!(
        notifier.texts(),
        vec!["Setting last check: Tue, 10 Mar 2015 00:00:00 +0000".to_string()]
    );
}

#[tokio::test]
async fn unparseable_checkpoint_gets_a_hint() {
    let (_, notifier, sync) = setup();
    let before = sync.checkpoint().await;

    let event = handle_command(
        &sync,
        EngineCommand::SetCheckpoint {
            text: "la settimana scorsa".to_string(),
            destination: chat(),
        },
    )
    .await;

    assert!(matches!(event, EngineEvent::CheckpointSet(Err(_))));
    assert_eq!(notifier.texts(), vec![BAD_DATE_REPLY.to_string()]);
    assert_eq!(sync.checkpoint().await, before);
}

#[tokio::test]
async fn list_resolves_italian_month_names() {
    let (source, notifier, sync) = setup();
    source.put(
        Period::new(2015, 3).unwrap(),
        vec![entry("Primo", "Dom 1 Mar 2015 12:22:43 CET", "001001.html")],
    );

    let event = handle_command(
        &sync,
        EngineCommand::ListPeriod {
            args: vec!["marzo".to_string()],
            destination: chat(),
        },
    )
    .await;

    match event {
        EngineEvent::ListCompleted(Ok(report)) => {
            assert_eq!(report.period, Period::new(2015, 3).unwrap());
            assert_eq!(report.entries, 1);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(notifier.texts()[0].starts_with("<b>Threads 2015 March</b>"));
}

#[tokio::test]
async fn unknown_period_is_answered_without_reading() {
    let (source, notifier, sync) = setup();

    let event = handle_command(
        &sync,
        EngineCommand::ListPeriod {
            args: vec!["2015".to_string(), "brumaio".to_string()],
            destination: chat(),
        },
    )
    .await;

    assert!(matches!(event, EngineEvent::ListCompleted(Err(_))));
    assert_eq!(source.reads(), 0);
    assert!(notifier.texts()[0].starts_with("Unknown period"));
}

#[tokio::test]
async fn unreadable_archive_is_reported_to_the_requester() {
    let (source, notifier, sync) = setup();
    source.fail(Period::new(2014, 10).unwrap());

    let event = handle_command(
        &sync,
        EngineCommand::ListPeriod {
            args: vec!["ottobre".to_string(), "2014".to_string()],
            destination: chat(),
        },
    )
    .await;

    assert!(matches!(event, EngineEvent::ListCompleted(Err(_))));
    assert_eq!(
        notifier.texts(),
        vec!["Could not read the archive for October 2014".to_string()]
    );
}

#[tokio::test]
async fn failed_cycle_is_not_reported_to_users() {
    let (source, notifier, sync) = setup();
    source.fail(Period::new(2015, 3).unwrap());

    let event = handle_command(
        &sync,
        EngineCommand::CheckForUpdates {
            destination: chat(),
        },
    )
    .await;

    assert!(matches!(event, EngineEvent::CycleCompleted(Err(_))));
    assert!(notifier.sent().is_empty());
}

#[test]
fn handle_runs_commands_off_thread() {
    let (source, notifier, sync) = setup();
    source.put(
        Period::new(2015, 3).unwrap(),
        vec![entry("Nuovo", "Mar 24 Mar 2015 11:00:00 CET", "001010.html")],
    );
    let handle = EngineHandle::new(sync.clone()).unwrap();

    handle.send(EngineCommand::SetCheckpoint {
        text: "2015-03-20".to_string(),
        destination: chat(),
    });
    let set = handle.recv_timeout(Duration::from_secs(5));
    assert_eq!(set, Some(EngineEvent::CheckpointSet(Ok(utc(2015, 3, 20, 0, 0, 0)))));

    handle.send(EngineCommand::CheckForUpdates {
        destination: chat(),
    });
    match handle.recv_timeout(Duration::from_secs(5)) {
        Some(EngineEvent::CycleCompleted(Ok(report))) => assert_eq!(report.new_entries, 1),
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(notifier.sent().len(), 2);
    assert!(handle.try_recv().is_none());
}
