//! StepForge Core - the stepping contract for debuggable solvers
//!
//! This crate provides the leaf abstractions for StepForge:
//! - `StepSolver`: algorithm hooks a concrete solver implements
//! - `Solver`: the object-safe setup/step/solve driver every solver gets
//! - `SolverState`: termination flags, iteration budget, progress and stats
//! - Graphics payload returned by `visualize()` and `preview()`
//! - Error types

pub mod error;
pub mod graphics;
pub mod solver;
pub mod stats;

pub use error::{Result, SolverError};
pub use graphics::{Circle, Coord, GraphicsObject, Line, Point, Rect, Text};
pub use solver::{
    short_type_name, FromInput, PipelineView, SharedOutput, Solver, SolverKind, SolverState, StepSolver,
    DEFAULT_MAX_ITERATIONS, DEFAULT_PIPELINE_MAX_ITERATIONS,
};
pub use stats::{stats_from, StageStats, Stats};
