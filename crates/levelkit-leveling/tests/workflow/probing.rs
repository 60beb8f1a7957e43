use std::collections::BTreeMap;
use std::sync::Arc;

use levelkit_core::{LevelingEvent, MachineEvent, Point3, Units};
use levelkit_leveling::{LevelingError, SessionState, WorkflowMessage};

use crate::support::*;

async fn probing_workflow() -> (
    Arc<RecordingController>,
    Arc<levelkit_core::EventBus>,
    levelkit_leveling::AutolevelWorkflow<RecordingController>,
) {
    let controller = Arc::new(RecordingController::default());
    let bus = history_bus();
    let mut wf = workflow(controller.clone(), bus.clone());
    wf.handle(port_opened()).await.unwrap();
    wf.handle(program_loaded("part.nc", PROGRAM)).await.unwrap();
    (controller, bus, wf)
}

#[tokio::test]
async fn test_start_sends_probe_program() {
    let (controller, bus, mut wf) = probing_workflow().await;

    let planned = wf.start_probing().await.unwrap();
    assert_eq!(planned, 4);
    assert_eq!(wf.session().state(), SessionState::Active);

    let lines = controller.gcode_lines();
    assert_eq!(lines[0], "(AL: probing initial point)");
    assert_eq!(lines[4], "G0 X0.000 Y0.000 Z3");
    assert_eq!(lines.len(), 8 + 3 * 3);
    assert_eq!(lines.iter().filter(|l| l.starts_with("G38.2")).count(), 4);

    let events = leveling_events(&bus);
    assert!(events.contains(&LevelingEvent::ProbingStarted { planned: 4 }));
}

#[tokio::test]
async fn test_full_run_loads_compensated_program() {
    let (controller, bus, mut wf) = probing_workflow().await;
    wf.handle(positions(Point3::new(5.0, 5.0, 0.0), Point3::new(5.0, 5.0, 1.0)))
        .await
        .unwrap();
    assert_eq!(wf.work_offset(), Point3::new(0.0, 0.0, -1.0));

    wf.handle(WorkflowMessage::StartProbing).await.unwrap();
    for report in [
        "[PRB:0.000,0.000,-1.000:1]",
        "ok",
        "[PRB:10.000,0.000,0.000:1]",
        "<Idle|MPos:10.000,0.000,3.000|FS:0,0>",
        "[PRB:0.000,10.000,-1.000:1]",
        "[PRB:10.000,10.000,0.000:1]",
    ] {
        wf.handle(line(report)).await.unwrap();
    }

    assert_eq!(wf.session().state(), SessionState::Complete);
    let mesh = wf.mesh().unwrap();
    assert_eq!(mesh.len(), 4);
    assert_eq!(mesh.points()[1], Point3::new(10.0, 0.0, 1.0));

    let loaded = controller.loaded_programs();
    assert_eq!(loaded.len(), 1);
    let (name, gcode) = &loaded[0];
    assert_eq!(name, "#AL:part.nc");
    let lines: Vec<&str> = gcode.lines().collect();
    assert_eq!(lines[0], "G21");
    assert_eq!(lines[2], "G0 X0.000 Y0.000 Z1.000 ; Z1.000");
    assert_eq!(*lines.last().unwrap(), "M5");
    assert!(lines.contains(&"G1 F300 X10.000 Y10.000 Z0.000 ; Z-1.000"));

    let output = wf.output().unwrap();
    assert_eq!(output.report.compensated, 2);
    assert_eq!(output.report.fallbacks, 0);

    let events = leveling_events(&bus);
    assert!(events.contains(&LevelingEvent::MeshCompleted { points: 4 }));
    assert!(events.iter().any(|e| matches!(
        e,
        LevelingEvent::ProgramCompensated { name, compensated: 2, fallbacks: 0, .. } if name == "#AL:part.nc"
    )));
    let probed = events
        .iter()
        .filter(|e| matches!(e, LevelingEvent::PointProbed { .. }))
        .count();
    assert_eq!(probed, 4);

    // the echoed program does not replace the source
    wf.handle(program_loaded("#AL:part.nc", gcode)).await.unwrap();
    assert_eq!(wf.program().unwrap().name, "part.nc");

    // extra reports after completion are dropped
    wf.handle(line("[PRB:1.000,1.000,1.000:1]")).await.unwrap();
    assert_eq!(controller.loaded_programs().len(), 1);
}

/// Every rewritten move whose Z equals its annotated original Z
fn unchanged_moves(gcode: &str) -> (usize, usize) {
    let moves: Vec<&str> = gcode.lines().filter(|l| l.contains(" ; Z")).collect();
    let unchanged = moves
        .iter()
        .filter(|l| {
            let (emitted, original) = l.split_once(" ; Z").unwrap();
            emitted.ends_with(&format!(" Z{}", original))
        })
        .count();
    (unchanged, moves.len())
}

#[tokio::test]
async fn test_flat_surface_leaves_z_alone_under_work_offset() {
    let (controller, _bus, mut wf) = probing_workflow().await;
    wf.handle(work_coordinate_offset(Point3::new(0.0, 0.0, -2.0)))
        .await
        .unwrap();

    wf.handle(WorkflowMessage::StartProbing).await.unwrap();
    for report in [
        "[PRB:0.000,0.000,-3.000:1]",
        "[PRB:10.000,0.000,-3.000:1]",
        "[PRB:0.000,10.000,-3.000:1]",
        "[PRB:10.000,10.000,-3.000:1]",
    ] {
        wf.handle(line(report)).await.unwrap();
    }

    assert!(wf.mesh().unwrap().points().iter().all(|p| p.z == 0.0));
    let (_, gcode) = &controller.loaded_programs()[0];
    assert!(gcode.contains("G0 X0.000 Y0.000 Z1.000 ; Z1.000"));
    assert!(gcode.contains("G1 F300 X10.000 Y10.000 Z-1.000 ; Z-1.000"));
    let (unchanged, total) = unchanged_moves(gcode);
    assert!(total > 2);
    assert_eq!(unchanged, total);
}

#[tokio::test]
async fn test_zeroing_after_first_point_does_not_bias_mesh() {
    let controller = Arc::new(RecordingController::default());
    let mut wf = workflow(controller.clone(), history_bus());
    wf.handle(port_opened()).await.unwrap();
    wf.handle(program_loaded(
        "tilt.nc",
        "G21\nG90\nG0 X0 Y0 Z1\nG0 X10 Y10\nG0 X5 Y5 Z0\n",
    ))
    .await
    .unwrap();
    wf.handle(work_coordinate_offset(Point3::new(0.0, 0.0, -2.0)))
        .await
        .unwrap();

    wf.handle(WorkflowMessage::StartProbing).await.unwrap();
    wf.handle(line("[PRB:0.000,0.000,-3.000:1]")).await.unwrap();
    // G10 L20 P1 Z0 moved work zero onto the first point
    wf.handle(work_coordinate_offset(Point3::new(0.0, 0.0, -3.0)))
        .await
        .unwrap();
    for report in [
        "[PRB:10.000,0.000,-2.700:1]",
        "[PRB:0.000,10.000,-2.700:1]",
        "[PRB:10.000,10.000,-2.400:1]",
    ] {
        wf.handle(line(report)).await.unwrap();
    }

    let heights: Vec<f64> = wf.mesh().unwrap().points().iter().map(|p| p.z).collect();
    for (height, expected) in heights.iter().zip([0.0, 0.3, 0.3, 0.6]) {
        assert!((height - expected).abs() < 1e-9);
    }

    let (_, gcode) = &controller.loaded_programs()[0];
    assert!(gcode.contains("G0 X0.000 Y0.000 Z1.000 ; Z1.000"));
    assert!(gcode.ends_with("G0 X5.000 Y5.000 Z0.300 ; Z0.000\n"));
}

#[tokio::test]
async fn test_inch_reports_are_converted() {
    let (_controller, _bus, mut wf) = probing_workflow().await;
    let mut settings = BTreeMap::new();
    settings.insert("$13".to_string(), "1".to_string());
    wf.handle(WorkflowMessage::Machine(MachineEvent::SettingsChanged {
        controller: "Grbl".to_string(),
        settings,
    }))
    .await
    .unwrap();
    assert_eq!(wf.report_units(), Units::INCH);

    wf.start_probing().await.unwrap();
    wf.handle(line("[PRB:1.000,0.000,0.000:1]")).await.unwrap();
    let first = wf.session().collected()[0];
    assert!((first.x - 25.4).abs() < 1e-9);
}

#[tokio::test]
async fn test_failed_probe_does_not_count() {
    let (_controller, _bus, mut wf) = probing_workflow().await;
    wf.start_probing().await.unwrap();
    wf.handle(line("[PRB:0.000,0.000,0.000:0]")).await.unwrap();
    assert!(wf.session().collected().is_empty());
    assert!(wf.session().is_active());
}

#[tokio::test]
async fn test_completion_without_program_keeps_mesh() {
    let (controller, _bus, mut wf) = probing_workflow().await;
    wf.start_probing().await.unwrap();
    wf.handle(WorkflowMessage::Machine(MachineEvent::ProgramUnloaded))
        .await
        .unwrap();
    for report in [
        "[PRB:0,0,0:1]",
        "[PRB:10,0,0:1]",
        "[PRB:0,10,0:1]",
        "[PRB:10,10,0:1]",
    ] {
        wf.handle(line(report)).await.unwrap();
    }
    assert_eq!(wf.mesh().map(|m| m.len()), Some(4));
    assert!(controller.loaded_programs().is_empty());
    assert!(wf.output().is_none());
}

#[tokio::test]
async fn test_send_failure_cancels_run() {
    let controller = Arc::new(RecordingController::rejecting());
    let bus = history_bus();
    let mut wf = workflow(controller, bus.clone());
    wf.handle(port_opened()).await.unwrap();
    wf.handle(program_loaded("part.nc", PROGRAM)).await.unwrap();

    let err = wf.start_probing().await.unwrap_err();
    assert!(matches!(err, LevelingError::Machine(_)));
    assert_eq!(wf.session().state(), SessionState::Idle);
    assert!(leveling_events(&bus)
        .iter()
        .any(|e| matches!(e, LevelingEvent::SessionCancelled { .. })));
}
