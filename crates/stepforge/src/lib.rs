//! StepForge - steppable solvers and pipelines for interactive debugging
//!
//! Write a solver as a sequence of discrete steps, then step through it, run
//! it to completion, animate it, or chain it with other solvers into a
//! multi-stage pipeline.
//!
//! # Example
//!
//! ```rust
//! use stepforge::prelude::*;
//!
//! #[derive(Debug)]
//! struct Halve {
//!     state: SolverState,
//!     value: f64,
//! }
//!
//! impl StepSolver for Halve {
//!     type Output = f64;
//!
//!     fn solver_state(&self) -> &SolverState { &self.state }
//!     fn solver_state_mut(&mut self) -> &mut SolverState { &mut self.state }
//!
//!     fn on_step(&mut self) -> Result<()> {
//!         self.value /= 2.0;
//!         if self.value < 1.0 {
//!             self.state.mark_solved();
//!         }
//!         Ok(())
//!     }
//!
//!     fn output(&self) -> Option<f64> { Some(self.value) }
//! }
//!
//! let mut solver = Halve { state: SolverState::new(), value: 10.0 };
//! run_solver_with_config(&mut solver, &SolverConfig::default()).unwrap();
//!
//! assert!(solver.state().is_solved());
//! assert_eq!(solver.state().iterations(), 4);
//! ```

// Stepping contract
pub use stepforge_core::{
    FromInput, Result, SharedOutput, Solver, SolverError, SolverKind, SolverState, StepSolver,
    DEFAULT_MAX_ITERATIONS, DEFAULT_PIPELINE_MAX_ITERATIONS,
};

// Graphics payload
pub use stepforge_core::graphics;
pub use stepforge_core::{Circle, Coord, GraphicsObject, Line, Point, Rect, Text};

// Diagnostics
pub use stepforge_core::{stats_from, PipelineView, StageStats, Stats};

// Pipelines and the debugging harness
pub use stepforge_solver::{
    breadcrumb, solver_chain, Animator, ChainLink, CountingEventListener, Frame,
    LoggingEventListener, PipelineSolver, SolverSnapshot, StageDefinition, StageEventSupport,
    StageLifecycleListener, StageOutputs, StageTiming,
};

// Configuration
pub use stepforge_config::{AnimationConfig, ConfigError, SolverConfig};

#[cfg(feature = "console")]
pub use stepforge_console as console;

mod solver;
pub use solver::{apply_config, run_animated, run_solver, run_solver_with_config, CONFIG_FILE};

pub mod prelude {
    pub use super::{
        FromInput, Result, Solver, SolverError, SolverKind, SolverState, StepSolver,
    };
    pub use super::{Coord, GraphicsObject, Line, Point, Text};
    pub use super::{PipelineSolver, StageDefinition, StageOutputs};
    pub use super::{run_solver, run_solver_with_config, SolverConfig};
}
