//! # LevelKit G-Code
//!
//! Line-oriented G-code handling for LevelKit:
//! - [`parser`]: comment stripping and an explicit word tokenizer
//! - [`modal`]: distance-mode and units tracking across lines
//! - [`bounds`]: XY extent of the motion in a program

pub mod bounds;
pub mod modal;
pub mod parser;

pub use bounds::{bounds_in, extract_bounds, BoundsExtractor};
pub use modal::ModalState;
pub use parser::{strip_comments, Block, Code, Word};
