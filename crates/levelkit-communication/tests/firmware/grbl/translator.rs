use levelkit_communication::GrblEventTranslator;
use levelkit_core::{MachineEvent, MachineState, Point3, Units};

#[test]
fn test_every_line_is_forwarded() {
    let translator = GrblEventTranslator::new();
    let events = translator.translate("ok\r\n");
    assert_eq!(
        events,
        vec![MachineEvent::LineReceived {
            line: "ok".to_string()
        }]
    );
}

#[test]
fn test_probe_line_is_forwarded_verbatim() {
    let translator = GrblEventTranslator::new();
    let events = translator.translate("[PRB:1.000,2.000,-0.500:1]");
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        MachineEvent::LineReceived {
            line: "[PRB:1.000,2.000,-0.500:1]".to_string()
        }
    );
}

#[test]
fn test_status_report_becomes_state_change() {
    let translator = GrblEventTranslator::new();
    let events = translator.translate("<Idle|MPos:5.000,5.000,-1.000|WPos:0.000,0.000,0.000>");
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        MachineEvent::StateChanged {
            controller: "Grbl".to_string(),
            state: MachineState {
                units: None,
                machine_position: Some(Point3::new(5.0, 5.0, -1.0)),
                work_position: Some(Point3::new(0.0, 0.0, 0.0)),
                work_offset: None,
            },
        }
    );
}

#[test]
fn test_parser_state_reports_units() {
    let translator = GrblEventTranslator::new();
    let events = translator.translate("[GC:G0 G54 G17 G20 G90 G94 M5 M9 T0 F0 S0]");
    match &events[1] {
        MachineEvent::StateChanged { state, .. } => {
            assert_eq!(state.units, Some(Units::INCH));
            assert_eq!(state.machine_position, None);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_setting_becomes_settings_change() {
    let translator = GrblEventTranslator::new();
    let events = translator.translate("$13=1");
    match &events[1] {
        MachineEvent::SettingsChanged { settings, .. } => {
            assert_eq!(settings.get("$13").map(String::as_str), Some("1"));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_alarm_only_forwards_line() {
    let translator = GrblEventTranslator::new();
    assert_eq!(translator.translate("ALARM:4").len(), 1);
}
