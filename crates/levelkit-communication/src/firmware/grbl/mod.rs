//! GRBL protocol support

pub mod response_parser;
pub mod translator;

pub use response_parser::{
    GrblResponse, GrblResponseParser, ParserState, ProbeReport, StatusReport,
};
pub use translator::GrblEventTranslator;
