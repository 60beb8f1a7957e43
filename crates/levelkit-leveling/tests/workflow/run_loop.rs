use std::sync::Arc;
use std::time::Duration;

use levelkit_core::{AppEvent, LevelingEvent};
use levelkit_leveling::{AutolevelWorkflow, SessionState, WorkflowMessage};
use levelkit_settings::{AutolevelSettings, Config};
use tokio::sync::mpsc;

use crate::support::*;

#[tokio::test]
async fn test_run_processes_messages_in_order() {
    let controller = Arc::new(RecordingController::default());
    let bus = history_bus();
    let mut events = bus.receiver();
    let wf = workflow(controller.clone(), bus);
    let (tx, rx) = mpsc::channel(64);
    let handle = tokio::spawn(wf.run(rx));

    tx.send(port_opened()).await.unwrap();
    tx.send(program_loaded("part.nc", PROGRAM)).await.unwrap();
    // errors are logged, not fatal
    tx.send(WorkflowMessage::UpdateSettings(AutolevelSettings {
        delta: 0.0,
        ..test_settings()
    }))
    .await
    .unwrap();
    tx.send(WorkflowMessage::StartProbing).await.unwrap();
    for report in [
        "[PRB:0,0,0:1]",
        "[PRB:10,0,0:1]",
        "[PRB:0,10,0:1]",
        "[PRB:10,10,0:1]",
    ] {
        tx.send(line(report)).await.unwrap();
    }
    drop(tx);

    let wf = handle.await.unwrap();
    assert_eq!(wf.session().state(), SessionState::Complete);
    assert_eq!(controller.loaded_programs().len(), 1);
    assert_eq!(wf.output().unwrap().name, "#AL:part.nc");

    let mut received = Vec::new();
    while let Ok(AppEvent::Leveling(event)) = events.try_recv() {
        received.push(event);
    }
    assert!(matches!(received[0], LevelingEvent::BoundsMeasured { .. }));
    assert_eq!(received[1], LevelingEvent::ProbingStarted { planned: 4 });
    assert!(matches!(
        received.last(),
        Some(LevelingEvent::ProgramCompensated { .. })
    ));
}

#[tokio::test]
async fn test_inactivity_timeout_cancels_run() {
    let controller = Arc::new(RecordingController::default());
    let bus = history_bus();
    let config = Config {
        autolevel: AutolevelSettings {
            probe_timeout_secs: Some(1),
            ..test_settings()
        },
        ..Config::default()
    };
    let wf = AutolevelWorkflow::new(controller, config)
        .unwrap()
        .with_event_bus(bus.clone());
    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(wf.run(rx));

    tx.send(port_opened()).await.unwrap();
    tx.send(program_loaded("part.nc", PROGRAM)).await.unwrap();
    tx.send(WorkflowMessage::StartProbing).await.unwrap();
    tx.send(line("[PRB:0,0,0:1]")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    drop(tx);

    let wf = handle.await.unwrap();
    assert_eq!(wf.session().state(), SessionState::Idle);
    assert!(leveling_events(&bus)
        .iter()
        .any(|e| matches!(e, LevelingEvent::SessionCancelled { reason } if reason.contains("1 s"))));
}

#[tokio::test]
async fn test_no_timeout_by_default() {
    let wf = workflow(Arc::new(RecordingController::default()), history_bus());
    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(wf.run(rx));

    tx.send(port_opened()).await.unwrap();
    tx.send(program_loaded("part.nc", PROGRAM)).await.unwrap();
    tx.send(WorkflowMessage::StartProbing).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(tx);

    let wf = handle.await.unwrap();
    assert!(wf.session().is_active());
}
