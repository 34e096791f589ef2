//! The stepping contract shared by every solver.
//!
//! Solver authors implement [`StepSolver`], which exposes the algorithm
//! hooks. Callers drive solvers through [`Solver`], which is implemented once
//! for every `StepSolver` and owns the setup/step/solve bookkeeping.
//!
//! # Example
//!
//! ```
//! use stepforge_core::{Result, Solver, SolverState, StepSolver};
//!
//! #[derive(Debug)]
//! struct CountTo {
//!     state: SolverState,
//!     count: u64,
//!     target: u64,
//! }
//!
//! impl StepSolver for CountTo {
//!     type Output = u64;
//!
//!     fn solver_state(&self) -> &SolverState { &self.state }
//!     fn solver_state_mut(&mut self) -> &mut SolverState { &mut self.state }
//!
//!     fn on_step(&mut self) -> Result<()> {
//!         self.count += 1;
//!         if self.count == self.target {
//!             self.state.mark_solved();
//!         }
//!         Ok(())
//!     }
//!
//!     fn output(&self) -> Option<u64> { Some(self.count) }
//! }
//!
//! let mut solver = CountTo { state: SolverState::new(), count: 0, target: 5 };
//! solver.solve().unwrap();
//!
//! assert!(solver.state().is_solved());
//! assert_eq!(solver.state().iterations(), 5);
//! assert_eq!(solver.output(), Some(5));
//! ```

use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SolverError};
use crate::graphics::GraphicsObject;
use crate::stats::{stats_from, StageStats, Stats};

/// Default iteration budget for plain solvers.
pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000;

/// Default iteration budget for pipelines, which must cover all child iterations.
pub const DEFAULT_PIPELINE_MAX_ITERATIONS: u64 = 1_000_000;

/// A solver output shared without copying.
pub type SharedOutput = Arc<dyn Any + Send + Sync>;

/// Bookkeeping every solver carries.
///
/// `solved` and `failed` are mutually exclusive and never revert once a step
/// has returned. A step whose hook faults ends failed even if the hook marked
/// the solver solved first.
/// `iterations` only grows, and only the driver advances it.
#[derive(Debug, Clone)]
pub struct SolverState {
    solved: bool,
    failed: bool,
    iterations: u64,
    max_iterations: u64,
    progress: f64,
    error: Option<String>,
    stats: Stats,
    setup_done: bool,
    time_to_solve: Option<Duration>,
}

impl SolverState {
    /// Creates a fresh state with the default iteration budget.
    pub fn new() -> Self {
        Self::with_max_iterations(DEFAULT_MAX_ITERATIONS)
    }

    /// Creates a fresh state with the given iteration budget.
    pub fn with_max_iterations(max_iterations: u64) -> Self {
        Self {
            solved: false,
            failed: false,
            iterations: 0,
            max_iterations,
            progress: 0.0,
            error: None,
            stats: Stats::new(),
            setup_done: false,
            time_to_solve: None,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns true once the solver has either solved or failed.
    pub fn is_terminal(&self) -> bool {
        self.solved || self.failed
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, max_iterations: u64) {
        self.max_iterations = max_iterations;
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Sets progress, clamped to `[0, 1]`.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn setup_done(&self) -> bool {
        self.setup_done
    }

    /// Wall-clock time of the last `solve()` call.
    pub fn time_to_solve(&self) -> Option<Duration> {
        self.time_to_solve
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    /// Merges a typed statistics record into the stats map.
    pub fn record_stats<T: Serialize>(&mut self, record: &T) -> Result<()> {
        self.stats.extend(stats_from(record)?);
        Ok(())
    }

    /// Marks the solver solved. Ignored once the solver has failed.
    pub fn mark_solved(&mut self) {
        if !self.failed {
            self.solved = true;
        }
    }

    /// Marks the solver failed with `error`. Ignored once the solver is terminal.
    pub fn fail(&mut self, error: impl Into<String>) {
        if !self.is_terminal() {
            self.failed = true;
            self.error = Some(error.into());
        }
    }
}

impl Default for SolverState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a pipeline's stage machinery.
pub trait PipelineView {
    /// Stage names in execution order.
    fn stage_names(&self) -> Vec<&str>;

    /// Index of the current stage; equals the stage count once done.
    fn current_stage_index(&self) -> usize;

    /// Name of the current stage, or `None` once every stage has completed.
    fn current_stage(&self) -> Option<&str>;

    /// Completed stages plus the active stage's own progress, over the stage count.
    fn stage_progress(&self) -> f64;

    /// Per-stage timing and iteration statistics.
    fn stage_stats(&self) -> Vec<StageStats>;
}

/// Which capability variant a solver is.
#[derive(Clone, Copy)]
pub enum SolverKind<'a> {
    Plain,
    Pipeline(&'a dyn PipelineView),
}

impl SolverKind<'_> {
    pub fn is_pipeline(&self) -> bool {
        matches!(self, SolverKind::Pipeline(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            SolverKind::Plain => "plain",
            SolverKind::Pipeline(_) => "pipeline",
        }
    }
}

impl Debug for SolverKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Plain => f.write_str("Plain"),
            SolverKind::Pipeline(view) => f
                .debug_struct("Pipeline")
                .field("current_stage", &view.current_stage())
                .finish(),
        }
    }
}

/// Algorithm hooks supplied by a concrete solver.
///
/// Only `solver_state`, `solver_state_mut` and `on_step` are required.
/// Hooks are invoked by the [`Solver`] driver; do not call them directly.
pub trait StepSolver: Send + Debug + 'static {
    /// The externally meaningful result of this solver.
    type Output: Send + Sync + 'static;

    fn solver_state(&self) -> &SolverState;

    fn solver_state_mut(&mut self) -> &mut SolverState;

    /// Identity used in error messages and logs.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// One-time initialization, run before the first step.
    fn on_setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Advances the algorithm by one unit of work.
    fn on_step(&mut self) -> Result<()>;

    /// Last chance to accept an approximate result when the budget runs out.
    fn try_final_acceptance(&mut self) {}

    /// Progress in `[0, 1]`, if the solver can estimate it.
    fn compute_progress(&self) -> Option<f64> {
        None
    }

    fn render(&self) -> GraphicsObject {
        GraphicsObject::default()
    }

    /// Cheaper rendering for high-frequency polling.
    fn render_preview(&self) -> GraphicsObject {
        GraphicsObject::default()
    }

    /// Data that reconstructs an equivalent solver, for export.
    fn export_params(&self) -> Result<Value> {
        Err(SolverError::NotImplemented("constructor_params"))
    }

    /// The result; only meaningful once solved.
    fn output(&self) -> Option<Self::Output> {
        None
    }

    /// The child solver currently being delegated to.
    fn sub_solver(&self) -> Option<&dyn Solver> {
        None
    }

    fn pipeline_view(&self) -> Option<&dyn PipelineView> {
        None
    }
}

/// A solver constructible from a single input value.
///
/// Pipeline stages build their child solvers through this trait.
pub trait FromInput: StepSolver + Sized {
    type Input;

    fn from_input(input: Self::Input) -> Self;
}

/// Object-safe driver interface used by callers, pipelines and UIs.
pub trait Solver: Send + Debug {
    fn solver_name(&self) -> &'static str;

    fn kind(&self) -> SolverKind<'_>;

    fn state(&self) -> &SolverState;

    fn set_max_iterations(&mut self, max_iterations: u64);

    /// Runs the one-time setup hook; later calls are no-ops.
    fn setup(&mut self) -> Result<()>;

    /// Advances the solver by one iteration.
    ///
    /// Stepping a solved or failed solver is a silent no-op. A hook error is
    /// recorded as a failure and returned. Running out of iterations is
    /// recorded as a failure but returns `Ok`.
    fn step(&mut self) -> Result<()>;

    /// Steps until solved or failed, recording the elapsed time.
    fn solve(&mut self) -> Result<()>;

    fn visualize(&self) -> GraphicsObject;

    fn preview(&self) -> GraphicsObject;

    fn constructor_params(&self) -> Result<Value>;

    /// The output, type-erased for storage by pipelines.
    fn output_any(&self) -> Option<SharedOutput>;

    fn active_sub_solver(&self) -> Option<&dyn Solver>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: StepSolver> Solver for T {
    fn solver_name(&self) -> &'static str {
        self.name()
    }

    fn kind(&self) -> SolverKind<'_> {
        match self.pipeline_view() {
            Some(view) => SolverKind::Pipeline(view),
            None => SolverKind::Plain,
        }
    }

    fn state(&self) -> &SolverState {
        self.solver_state()
    }

    fn set_max_iterations(&mut self, max_iterations: u64) {
        self.solver_state_mut().set_max_iterations(max_iterations);
    }

    fn setup(&mut self) -> Result<()> {
        if self.solver_state().setup_done {
            return Ok(());
        }
        self.solver_state_mut().setup_done = true;
        self.on_setup().map_err(|err| record_fault(self, err))
    }

    fn step(&mut self) -> Result<()> {
        self.setup()?;
        if self.solver_state().is_terminal() {
            return Ok(());
        }

        let name = self.name();
        let state = self.solver_state_mut();
        state.iterations += 1;
        trace!(event = "step", solver = name, iteration = state.iterations);

        if let Err(err) = self.on_step() {
            // The solver was live when this step began, so any solve seen here
            // was declared by the faulting hook itself.
            self.solver_state_mut().solved = false;
            return Err(record_fault(self, err));
        }

        let state = self.solver_state();
        if !state.is_terminal() && state.iterations >= state.max_iterations {
            self.try_final_acceptance();
            if !self.solver_state().solved {
                let error = format!("{name} ran out of iterations");
                warn!(event = "solver_failed", solver = name, error = %error);
                self.solver_state_mut().fail(error);
            }
        }

        if let Some(progress) = self.compute_progress() {
            self.solver_state_mut().set_progress(progress);
        }
        Ok(())
    }

    fn solve(&mut self) -> Result<()> {
        let name = self.name();
        let start = Instant::now();
        debug!(event = "solve_start", solver = name);

        let result = loop {
            if self.solver_state().is_terminal() {
                break Ok(());
            }
            if let Err(err) = self.step() {
                break Err(err);
            }
        };

        let elapsed = start.elapsed();
        let state = self.solver_state_mut();
        state.time_to_solve = Some(elapsed);
        info!(
            event = "solve_end",
            solver = name,
            iterations = state.iterations,
            duration_ms = elapsed.as_millis() as u64,
            solved = state.solved,
        );
        result
    }

    fn visualize(&self) -> GraphicsObject {
        self.render()
    }

    fn preview(&self) -> GraphicsObject {
        self.render_preview()
    }

    fn constructor_params(&self) -> Result<Value> {
        self.export_params()
    }

    fn output_any(&self) -> Option<SharedOutput> {
        self.output().map(|output| Arc::new(output) as SharedOutput)
    }

    fn active_sub_solver(&self) -> Option<&dyn Solver> {
        self.sub_solver()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// Records a hook error as this solver's failure, unless a failure is already recorded.
fn record_fault<T: StepSolver>(solver: &mut T, err: SolverError) -> SolverError {
    let name = solver.name();
    let err = err.attributed_to(name);
    let state = solver.solver_state_mut();
    if !state.failed {
        warn!(event = "solver_failed", solver = name, error = %err);
        state.fail(err.to_string());
    }
    err
}

/// Strips the module path and generic arguments from a type name.
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
#[path = "solver_tests.rs"]
mod tests;
