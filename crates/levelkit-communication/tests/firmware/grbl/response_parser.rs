use levelkit_communication::firmware::grbl::response_parser::*;
use levelkit_core::{Point3, Units};
use proptest::prelude::*;

#[test]
fn test_parse_ok() {
    let parser = GrblResponseParser::new();
    assert_eq!(parser.parse("ok"), Some(GrblResponse::Ok));
    assert_eq!(parser.parse("  ok\r\n"), Some(GrblResponse::Ok));
}

#[test]
fn test_parse_empty() {
    let parser = GrblResponseParser::new();
    assert_eq!(parser.parse(""), None);
    assert_eq!(parser.parse("   "), None);
}

#[test]
fn test_parse_error() {
    let parser = GrblResponseParser::new();
    assert_eq!(parser.parse("error:1"), Some(GrblResponse::Error(1)));
    assert_eq!(parser.parse("error:23"), Some(GrblResponse::Error(23)));
}

#[test]
fn test_parse_alarm() {
    let parser = GrblResponseParser::new();
    assert_eq!(parser.parse("alarm:1"), Some(GrblResponse::Alarm(1)));
    assert_eq!(parser.parse("ALARM:5"), Some(GrblResponse::Alarm(5)));
}

#[test]
fn test_parse_status_report() {
    let parser = GrblResponseParser::new();
    let response = parser.parse("<Idle|MPos:0.000,0.000,0.000|WPos:0.000,0.000,0.000>");

    if let Some(GrblResponse::Status(status)) = response {
        assert_eq!(status.state, "Idle");
        assert_eq!(status.machine_pos, Some(Point3::new(0.0, 0.0, 0.0)));
        assert_eq!(status.work_pos, Some(Point3::new(0.0, 0.0, 0.0)));
        assert_eq!(status.work_coord_offset, None);
    } else {
        panic!("expected status report, got {:?}", response);
    }
}

#[test]
fn test_parse_status_with_offset_and_feed() {
    let parser = GrblResponseParser::new();
    let response = parser.parse("<Run|MPos:10.000,5.000,-2.500|FS:500,12000|WCO:-5.000,1.000,-3.000>");

    if let Some(GrblResponse::Status(status)) = response {
        assert_eq!(status.state, "Run");
        assert_eq!(status.machine_pos, Some(Point3::new(10.0, 5.0, -2.5)));
        assert_eq!(status.work_pos, None);
        assert_eq!(status.work_coord_offset, Some(Point3::new(-5.0, 1.0, -3.0)));
        assert_eq!(status.feed_rate, Some(500.0));
        assert_eq!(status.spindle_speed, Some(12000));
    } else {
        panic!("expected status report, got {:?}", response);
    }
}

#[test]
fn test_parse_probe_report() {
    let parser = GrblResponseParser::new();
    let response = parser.parse("[PRB:-12.500,4.000,-1.250:1]");
    assert_eq!(
        response,
        Some(GrblResponse::Probe(ProbeReport {
            position: Point3::new(-12.5, 4.0, -1.25),
            a: None,
            success: true,
        }))
    );
}

#[test]
fn test_malformed_probe_is_feedback() {
    let parser = GrblResponseParser::new();
    assert_eq!(
        parser.parse("[PRB:1.0,2.0:1]"),
        Some(GrblResponse::Feedback("PRB:1.0,2.0:1".to_string()))
    );
}

#[test]
fn test_parse_parser_state() {
    let parser = GrblResponseParser::new();
    let response = parser.parse("[GC:G0 G54 G17 G20 G91 G94 M5 M9 T0 F0 S0]");
    if let Some(GrblResponse::ParserState(state)) = response {
        assert_eq!(state.units, Some(Units::INCH));
        assert_eq!(state.absolute, Some(false));
        assert!(state.raw.starts_with("G0 G54"));
    } else {
        panic!("expected parser state, got {:?}", response);
    }
}

#[test]
fn test_parse_setting() {
    let parser = GrblResponseParser::new();
    assert_eq!(
        parser.parse("$13=1"),
        Some(GrblResponse::Setting {
            number: 13,
            value: "1".to_string()
        })
    );
    assert_eq!(
        parser.parse("$110=5000.000"),
        Some(GrblResponse::Setting {
            number: 110,
            value: "5000.000".to_string()
        })
    );
}

#[test]
fn test_parse_version_and_message() {
    let parser = GrblResponseParser::new();
    assert_eq!(
        parser.parse("Grbl 1.1h ['$' for help]"),
        Some(GrblResponse::Version("Grbl 1.1h ['$' for help]".to_string()))
    );
    assert_eq!(
        parser.parse("[MSG:Caution: Unlocked]"),
        Some(GrblResponse::Feedback("MSG:Caution: Unlocked".to_string()))
    );
    assert_eq!(
        parser.parse("something else"),
        Some(GrblResponse::Message("something else".to_string()))
    );
}

proptest! {
    #[test]
    fn probe_reports_parse_back(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        z in -50.0f64..50.0,
        success in any::<bool>(),
    ) {
        let line = format!("[PRB:{:.3},{:.3},{:.3}:{}]", x, y, z, u8::from(success));
        let probe = GrblResponseParser::parse_probe(&line).unwrap();
        prop_assert!((probe.position.x - x).abs() < 1e-3);
        prop_assert!((probe.position.y - y).abs() < 1e-3);
        prop_assert!((probe.position.z - z).abs() < 1e-3);
        prop_assert_eq!(probe.success, success);
    }

    #[test]
    fn parser_never_panics(line in "\\PC{0,80}") {
        let _ = GrblResponseParser::new().parse(&line);
    }
}
