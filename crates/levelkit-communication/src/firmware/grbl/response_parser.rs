//! GRBL Response Parser
//!
//! This module parses GRBL protocol responses including status reports,
//! probe reports, parser state, error and alarm messages, and settings.

use levelkit_core::{Point3, Units};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// GRBL response types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GrblResponse {
    /// OK acknowledgment
    Ok,
    /// Error response with error code
    Error(u8),
    /// Alarm response with alarm code
    Alarm(u8),
    /// Status report
    Status(StatusReport),
    /// Probe result (`[PRB:...]`)
    Probe(ProbeReport),
    /// G-code parser state (`[GC:...]`)
    ParserState(ParserState),
    /// Setting response ($n=value)
    Setting {
        /// Setting number
        number: u16,
        /// Raw value
        value: String,
    },
    /// Version information
    Version(String),
    /// Any other bracketed feedback message
    Feedback(String),
    /// Startup message or other text
    Message(String),
}

impl fmt::Display for GrblResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error(code) => write!(
                f,
                "error:{} ({})",
                code,
                GrblResponseParser::error_description(*code)
            ),
            Self::Alarm(code) => write!(
                f,
                "ALARM:{} ({})",
                code,
                GrblResponseParser::alarm_description(*code)
            ),
            Self::Status(status) => write!(f, "status:{}", status.state),
            Self::Probe(probe) => write!(f, "probe:{}", probe.position),
            Self::ParserState(state) => write!(f, "parser_state:{}", state.raw),
            Self::Setting { number, value } => write!(f, "setting:${}={}", number, value),
            Self::Version(version) => write!(f, "version:{}", version),
            Self::Feedback(msg) => write!(f, "feedback:{}", msg),
            Self::Message(msg) => write!(f, "message:{}", msg),
        }
    }
}

/// GRBL status report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Machine state (Idle, Run, Hold, Alarm, ...)
    pub state: String,
    /// Machine position, when reported
    pub machine_pos: Option<Point3>,
    /// Work position, when reported
    pub work_pos: Option<Point3>,
    /// Work coordinate offset, when reported
    pub work_coord_offset: Option<Point3>,
    /// Feed rate
    pub feed_rate: Option<f64>,
    /// Spindle speed (RPM)
    pub spindle_speed: Option<u32>,
}

/// Result of a probing cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Contact position in machine coordinates, in report units
    pub position: Point3,
    /// Fourth axis position, when the controller reports one
    pub a: Option<f64>,
    /// Whether the probe actually triggered
    pub success: bool,
}

/// Modal parser state from `$G`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserState {
    /// Active units, if G20/G21 was listed
    pub units: Option<Units>,
    /// Absolute distance mode, if G90/G91 was listed
    pub absolute: Option<bool>,
    /// The words as reported
    pub raw: String,
}

fn probe_regex() -> &'static Regex {
    static PROBE_REGEX: OnceLock<Regex> = OnceLock::new();
    PROBE_REGEX.get_or_init(|| {
        let num = r"([+-]?\d*\.?\d+)";
        Regex::new(&format!(
            r"^\[PRB:{num},{num},{num}(?:,{num})?:(\d)\]$",
            num = num
        ))
        .expect("invalid regex pattern")
    })
}

/// GRBL response parser
#[derive(Debug, Default, Clone)]
pub struct GrblResponseParser;

impl GrblResponseParser {
    /// Create a new GRBL response parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a GRBL response line
    pub fn parse(&self, line: &str) -> Option<GrblResponse> {
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        if line == "ok" {
            return Some(GrblResponse::Ok);
        }

        if let Some(stripped) = line.strip_prefix("error:") {
            if let Ok(code) = stripped.trim().parse::<u8>() {
                return Some(GrblResponse::Error(code));
            }
        }

        if let Some(stripped) = line
            .strip_prefix("ALARM:")
            .or_else(|| line.strip_prefix("alarm:"))
        {
            if let Ok(code) = stripped.trim().parse::<u8>() {
                return Some(GrblResponse::Alarm(code));
            }
        }

        if line.starts_with('<') && line.ends_with('>') {
            return self.parse_status_report(&line[1..line.len() - 1]);
        }

        if line.starts_with("[PRB:") {
            if let Some(probe) = Self::parse_probe(line) {
                return Some(GrblResponse::Probe(probe));
            }
        }

        if let Some(words) = line
            .strip_prefix("[GC:")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Some(GrblResponse::ParserState(Self::parse_parser_state(words)));
        }

        if line.starts_with('$') && line.contains('=') {
            if let Some(setting) = self.parse_setting(line) {
                return Some(setting);
            }
        }

        if line.starts_with("Grbl ") || line.starts_with("GrblHAL ") {
            return Some(GrblResponse::Version(line.to_string()));
        }

        if line.starts_with('[') && line.ends_with(']') {
            return Some(GrblResponse::Feedback(line[1..line.len() - 1].to_string()));
        }

        Some(GrblResponse::Message(line.to_string()))
    }

    /// Parse a `[PRB:x,y,z[,a]:status]` probe report
    ///
    /// Returns `None` for anything that does not match the pattern exactly.
    pub fn parse_probe(line: &str) -> Option<ProbeReport> {
        let caps = probe_regex().captures(line.trim())?;
        let axis = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());

        Some(ProbeReport {
            position: Point3::new(axis(1)?, axis(2)?, axis(3)?),
            a: axis(4),
            success: caps.get(5)?.as_str() == "1",
        })
    }

    fn parse_parser_state(words: &str) -> ParserState {
        let mut units = None;
        let mut absolute = None;
        for word in words.split_whitespace() {
            match word {
                "G20" => units = Some(Units::INCH),
                "G21" => units = Some(Units::MM),
                "G90" => absolute = Some(true),
                "G91" => absolute = Some(false),
                _ => {}
            }
        }
        ParserState {
            units,
            absolute,
            raw: words.to_string(),
        }
    }

    fn parse_status_report(&self, status_line: &str) -> Option<GrblResponse> {
        let mut parts = status_line.split('|');

        let state = parts.next()?.trim().to_string();

        let mut machine_pos = None;
        let mut work_pos = None;
        let mut work_coord_offset = None;
        let mut feed_rate = None;
        let mut spindle_speed = None;

        for part in parts {
            let part = part.trim();

            if let Some(pos_str) = part.strip_prefix("MPos:") {
                machine_pos = Self::parse_position(pos_str);
            } else if let Some(pos_str) = part.strip_prefix("WPos:") {
                work_pos = Self::parse_position(pos_str);
            } else if let Some(offset_str) = part.strip_prefix("WCO:") {
                work_coord_offset = Self::parse_position(offset_str);
            } else if let Some(fs_str) = part.strip_prefix("FS:") {
                let mut values = fs_str.split(',');
                feed_rate = values.next().and_then(|v| v.trim().parse::<f64>().ok());
                spindle_speed = values
                    .next()
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .map(|v| v as u32);
            } else if let Some(rate_str) = part.strip_prefix("F:") {
                feed_rate = rate_str.parse::<f64>().ok();
            }
        }

        Some(GrblResponse::Status(StatusReport {
            state,
            machine_pos,
            work_pos,
            work_coord_offset,
            feed_rate,
            spindle_speed,
        }))
    }

    fn parse_position(pos_str: &str) -> Option<Point3> {
        let coords: Vec<f64> = pos_str
            .split(',')
            .filter_map(|s| s.trim().parse::<f64>().ok())
            .collect();

        if coords.len() < 3 {
            return None;
        }

        Some(Point3::new(coords[0], coords[1], coords[2]))
    }

    fn parse_setting(&self, line: &str) -> Option<GrblResponse> {
        let (number, value) = line[1..].split_once('=')?;
        let number = number.trim().parse::<u16>().ok()?;

        Some(GrblResponse::Setting {
            number,
            value: value.trim().to_string(),
        })
    }

    /// Get error description
    pub fn error_description(code: u8) -> &'static str {
        match code {
            1 => "Expected command letter",
            2 => "Bad number format",
            3 => "Invalid statement",
            4 => "Negative value",
            5 => "Setting disabled",
            20 => "Unsupported or invalid g-code command",
            21 => "Modal group violation",
            22 => "Undefined feed rate",
            _ => "Unknown error",
        }
    }

    /// Get alarm description
    pub fn alarm_description(code: u8) -> &'static str {
        match code {
            1 => "Hard limit triggered",
            2 => "Soft limit exceeded",
            3 => "Abort during cycle",
            4 => "Probe fail: probe not in expected initial state",
            5 => "Probe fail: probe did not contact the workpiece",
            6 => "Homing fail",
            7 => "Homing fail pulloff",
            8 => "Spindle control failure",
            9 => "Cooling mist control failure",
            _ => "Unknown alarm",
        }
    }
}
