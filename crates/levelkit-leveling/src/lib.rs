//! # LevelKit Leveling
//!
//! The autolevel engine:
//! - [`planner`]: probe grid and probe program over a program's extent
//! - [`session`]: collects probe reports into a mesh
//! - [`mesh`]: local plane interpolation over the probed points
//! - [`rewriter`]: re-emits G-code with Z following the surface
//! - [`workflow`]: ties the above to a machine controller

pub mod error;
pub mod mesh;
pub mod planner;
pub mod rewriter;
pub mod session;
pub mod workflow;

pub use error::{LevelingError, LevelingResult, MeshError};
pub use mesh::HeightMesh;
pub use planner::{ProbeGrid, ProbeGridPlanner};
pub use rewriter::{
    compensate_program, final_units, subdivide, CompensationRewriter, RewriteOutput,
    RewriteReport,
};
pub use session::{replay_probe_log, ProbeOutcome, ProbeSession, SessionState};
pub use workflow::{AutolevelWorkflow, CompensatedProgram, LoadedProgram, WorkflowMessage};
