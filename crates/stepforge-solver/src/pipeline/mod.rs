//! Multi-stage pipeline solver.
//!
//! A [`PipelineSolver`] runs a fixed sequence of child solvers. Each stage's
//! child is built lazily from the pipeline's input problem and the outputs of
//! earlier stages, stepped to completion, and its output is stored under the
//! stage's name for later stages to read.
//!
//! Every outer `step()` consumes exactly one pipeline iteration: it either
//! creates the current stage's child or steps it once. One further step after
//! the last stage completes marks the pipeline solved.
//!
//! # Example
//!
//! ```
//! use stepforge_core::Solver;
//! use stepforge_solver::pipeline::{PipelineSolver, StageDefinition};
//! use stepforge_test::{CounterSolver, DoubleSolver, Doubled};
//!
//! let mut pipeline = PipelineSolver::new(
//!     vec![1.0, 2.0, 3.0],
//!     vec![
//!         StageDefinition::new::<DoubleSolver, _>("double", |p: &PipelineSolver<Vec<f64>>| {
//!             Ok(p.input().clone())
//!         }),
//!         StageDefinition::new::<CounterSolver, _>("count", |p| {
//!             let doubled = p.require_output::<Doubled>("double")?;
//!             Ok(doubled.values.len() as u64)
//!         }),
//!     ],
//! );
//! pipeline.solve().unwrap();
//!
//! assert!(pipeline.state().is_solved());
//! assert_eq!(pipeline.stage_output::<Doubled>("double").unwrap().sum, 12.0);
//! assert_eq!(pipeline.stage_output::<u64>("count"), Some(&3));
//! ```

mod stage;

pub use stage::{StageDefinition, StageOutputs, StageTiming};

use std::collections::HashSet;
use std::fmt::{self, Debug};
use std::sync::Arc;

use stepforge_core::{
    GraphicsObject, PipelineView, Result, Solver, SolverError, SolverState, StageStats, Stats,
    StepSolver, DEFAULT_PIPELINE_MAX_ITERATIONS,
};
use tracing::{info, warn};

use crate::event::{StageEventSupport, StageLifecycleListener};

/// Sequences child solvers, feeding each stage the outputs of earlier ones.
///
/// `P` is the pipeline's input problem, readable by every stage's input
/// derivation through [`PipelineSolver::input`].
pub struct PipelineSolver<P> {
    state: SolverState,
    name: &'static str,
    input: P,
    stages: Arc<[StageDefinition<P>]>,
    current_stage: usize,
    // Whether `solvers[current_stage]` is the running child.
    active: bool,
    solvers: Vec<Option<Box<dyn Solver>>>,
    outputs: StageOutputs,
    timings: Vec<StageTiming>,
    events: StageEventSupport,
    // First repeated stage name, reported by setup.
    duplicate: Option<String>,
}

impl<P> PipelineSolver<P> {
    /// Creates a pipeline over `stages` with the default pipeline budget.
    ///
    /// Stage names must be unique. A pipeline built here with a repeated name
    /// fails on its first step; use [`PipelineSolver::try_new`] to reject it
    /// up front.
    pub fn new(input: P, stages: Vec<StageDefinition<P>>) -> Self {
        let count = stages.len();
        let duplicate = duplicate_stage_name(&stages);
        Self {
            state: SolverState::with_max_iterations(DEFAULT_PIPELINE_MAX_ITERATIONS),
            name: "PipelineSolver",
            input,
            stages: stages.into(),
            current_stage: 0,
            active: false,
            solvers: (0..count).map(|_| None).collect(),
            outputs: StageOutputs::new(),
            timings: vec![StageTiming::default(); count],
            events: StageEventSupport::new(),
            duplicate,
        }
    }

    /// Creates a pipeline, rejecting repeated stage names.
    pub fn try_new(input: P, stages: Vec<StageDefinition<P>>) -> Result<Self> {
        match duplicate_stage_name(&stages) {
            Some(name) => Err(duplicate_stage_error(&name)),
            None => Ok(Self::new(input, stages)),
        }
    }

    /// Sets the name used in errors, logs and snapshots.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.state.set_max_iterations(max_iterations);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn StageLifecycleListener>) -> Self {
        self.events.add_listener(listener);
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn StageLifecycleListener>) {
        self.events.add_listener(listener);
    }

    /// The input problem shared by all stages.
    pub fn input(&self) -> &P {
        &self.input
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_definitions(&self) -> &[StageDefinition<P>] {
        &self.stages
    }

    /// Position of the stage called `name`.
    pub fn stage_index(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|stage| stage.name() == name)
    }

    /// Index of the current stage; equals the stage count once every stage completed.
    pub fn current_stage_index(&self) -> usize {
        self.current_stage
    }

    /// Name of the current stage, or `None` once every stage completed.
    pub fn current_stage(&self) -> Option<&str> {
        self.stages.get(self.current_stage).map(StageDefinition::name)
    }

    /// Output of a completed stage, if present and of type `T`.
    pub fn stage_output<T: 'static>(&self, name: &str) -> Option<&T> {
        self.outputs.get(name)
    }

    /// Like [`stage_output`](Self::stage_output), but an absent output is an error.
    ///
    /// Intended for stage input derivations, where a missing output means the
    /// stages are ordered wrongly.
    pub fn require_output<T: 'static>(&self, name: &str) -> Result<&T> {
        self.outputs
            .get(name)
            .ok_or_else(|| SolverError::MissingStageOutput(name.to_string()))
    }

    pub fn has_stage_output(&self, name: &str) -> bool {
        self.outputs.contains(name)
    }

    /// Shallow copy of every stored stage output.
    pub fn all_outputs(&self) -> StageOutputs {
        self.outputs.clone()
    }

    pub fn outputs(&self) -> &StageOutputs {
        &self.outputs
    }

    /// The child solver of `name`, once that stage has been instantiated.
    pub fn stage_solver(&self, name: &str) -> Option<&dyn Solver> {
        let index = self.stage_index(name)?;
        self.solvers[index].as_deref()
    }

    /// Typed access to the child solver of `name`.
    pub fn solver<C: 'static>(&self, name: &str) -> Option<&C> {
        self.stage_solver(name)?.as_any().downcast_ref::<C>()
    }

    pub fn stage_timing(&self, name: &str) -> Option<&StageTiming> {
        let index = self.stage_index(name)?;
        self.timings.get(index)
    }

    /// The pipeline's own stats map, for completion callbacks to annotate.
    pub fn stats_mut(&mut self) -> &mut Stats {
        self.state.stats_mut()
    }

    /// Completed stages plus the active stage's progress, over the stage count.
    ///
    /// Exactly 1 once solved; 0 for a pipeline without stages that has not solved.
    pub fn stage_progress(&self) -> f64 {
        if self.state.is_solved() {
            return 1.0;
        }
        let total = self.stages.len();
        if total == 0 {
            return 0.0;
        }
        let active = self
            .active_stage_solver()
            .map_or(0.0, |solver| solver.state().progress());
        (self.current_stage as f64 + active) / total as f64
    }

    /// Per-stage timing and iteration statistics.
    pub fn stage_stats(&self) -> Vec<StageStats> {
        self.stages
            .iter()
            .zip(&self.timings)
            .enumerate()
            .map(|(index, (stage, timing))| StageStats {
                name: stage.name().to_string(),
                index,
                time_spent: timing.elapsed(),
                iterations: self.stage_iterations(index),
                completed: index < self.current_stage,
            })
            .collect()
    }

    // Span from this stage's first iteration to the next stage's first
    // iteration, or to the current iteration when no later stage has started.
    fn stage_iterations(&self, index: usize) -> u64 {
        let Some(first) = self.timings[index].first_iteration else {
            return 0;
        };
        let end = self
            .timings
            .get(index + 1)
            .and_then(|next| next.first_iteration)
            .unwrap_or_else(|| self.state.iterations());
        end.saturating_sub(first)
    }

    fn active_stage_solver(&self) -> Option<&dyn Solver> {
        if !self.active {
            return None;
        }
        self.solvers.get(self.current_stage)?.as_deref()
    }
}

impl<P: Send + Debug + 'static> PipelineSolver<P> {
    /// Steps until the stage called `name` is current and its solver exists,
    /// or until the pipeline terminates.
    ///
    /// Returns immediately if that stage has already been passed. An unknown
    /// name is an error and does not step.
    pub fn solve_until_stage(&mut self, name: &str) -> Result<()> {
        let target = self
            .stage_index(name)
            .ok_or_else(|| SolverError::UnknownStage(name.to_string()))?;
        while !self.state.is_terminal()
            && (self.current_stage < target || (self.current_stage == target && !self.active))
        {
            self.step()?;
        }
        Ok(())
    }

    fn start_stage(&mut self) -> Result<()> {
        let index = self.current_stage;
        let stages = Arc::clone(&self.stages);
        let stage = &stages[index];

        let solver = stage.build(self)?;
        self.solvers[index] = Some(solver);
        self.timings[index] = StageTiming::started(self.state.iterations());
        self.active = true;

        info!(
            event = "stage_start",
            stage = stage.name(),
            stage_index = index,
            solver = stage.solver_type(),
        );
        self.events.fire_stage_started(index, stage.name());
        self.publish_stage_stats()
    }

    fn step_active_stage(&mut self) -> Result<()> {
        let index = self.current_stage;
        let Some(child) = self.solvers[index].as_deref_mut() else {
            return Err(SolverError::InvalidState(format!(
                "stage {index} is active but has no solver"
            )));
        };

        // A child fault is already recorded on the child; it is surfaced
        // unchanged after the stage bookkeeping below.
        let stepped = child.step();
        let (solved, failed) = (child.state().is_solved(), child.state().is_failed());
        if failed || stepped.is_err() {
            self.fail_stage(index)?;
        } else if solved {
            self.complete_stage(index)?;
        }
        stepped
    }

    fn complete_stage(&mut self, index: usize) -> Result<()> {
        let stages = Arc::clone(&self.stages);
        let stage = &stages[index];

        self.timings[index].finish();
        let time_spent = self.timings[index].time_spent;
        let mut steps = 0;
        if let Some(child) = self.solvers[index].as_deref() {
            steps = child.state().iterations();
            if let Some(output) = child.output_any() {
                self.outputs.insert(stage.name(), output);
            }
        }

        info!(
            event = "stage_end",
            stage = stage.name(),
            stage_index = index,
            duration_ms = time_spent.as_millis() as u64,
            steps,
        );
        self.events.fire_stage_completed(index, stage.name(), time_spent);

        if let Some(callback) = stage.completion() {
            callback(self);
        }
        self.active = false;
        self.current_stage += 1;
        self.publish_stage_stats()
    }

    fn fail_stage(&mut self, index: usize) -> Result<()> {
        let stages = Arc::clone(&self.stages);
        let stage = &stages[index];

        let error = self.solvers[index]
            .as_deref()
            .and_then(|child| child.state().error())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("stage '{}' failed", stage.name()));
        self.timings[index].finish();

        warn!(
            event = "stage_failed",
            stage = stage.name(),
            stage_index = index,
            error = %error,
        );
        self.events.fire_stage_failed(index, stage.name(), &error);

        self.active = false;
        self.state.fail(error);
        self.publish_stage_stats()
    }

    fn publish_stage_stats(&mut self) -> Result<()> {
        let stages = serde_json::to_value(self.stage_stats())?;
        let stats = self.state.stats_mut();
        stats.insert("stages".to_string(), stages);
        stats.insert("current_stage".to_string(), self.current_stage.into());
        Ok(())
    }
}

impl<P: Send + Debug + 'static> StepSolver for PipelineSolver<P> {
    type Output = StageOutputs;

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn on_setup(&mut self) -> Result<()> {
        match &self.duplicate {
            Some(name) => Err(duplicate_stage_error(name)),
            None => Ok(()),
        }
    }

    fn on_step(&mut self) -> Result<()> {
        if self.current_stage >= self.stages.len() {
            self.state.mark_solved();
            return Ok(());
        }
        if self.active {
            self.step_active_stage()
        } else {
            self.start_stage()
        }
    }

    fn compute_progress(&self) -> Option<f64> {
        Some(self.stage_progress())
    }

    fn render(&self) -> GraphicsObject {
        if let Some(child) = self.active_stage_solver() {
            return child.visualize();
        }
        GraphicsObject::merge_stages(self.solvers.iter().enumerate().filter_map(
            |(index, solver)| solver.as_deref().map(|solver| (index, solver.visualize())),
        ))
    }

    fn render_preview(&self) -> GraphicsObject {
        match self.active_stage_solver() {
            Some(child) => child.preview(),
            None => self.render(),
        }
    }

    fn output(&self) -> Option<StageOutputs> {
        Some(self.outputs.clone())
    }

    fn sub_solver(&self) -> Option<&dyn Solver> {
        self.active_stage_solver()
    }

    fn pipeline_view(&self) -> Option<&dyn PipelineView> {
        Some(self)
    }
}

impl<P> PipelineView for PipelineSolver<P> {
    fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(StageDefinition::name).collect()
    }

    fn current_stage_index(&self) -> usize {
        self.current_stage
    }

    fn current_stage(&self) -> Option<&str> {
        PipelineSolver::current_stage(self)
    }

    fn stage_progress(&self) -> f64 {
        PipelineSolver::stage_progress(self)
    }

    fn stage_stats(&self) -> Vec<StageStats> {
        PipelineSolver::stage_stats(self)
    }
}

impl<P: Debug> Debug for PipelineSolver<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSolver")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("stages", &self.stages)
            .field("current_stage", &self.current_stage)
            .field("active", &self.active)
            .field("outputs", &self.outputs)
            .field("state", &self.state)
            .finish()
    }
}

fn duplicate_stage_name<P>(stages: &[StageDefinition<P>]) -> Option<String> {
    let mut seen = HashSet::new();
    stages
        .iter()
        .map(StageDefinition::name)
        .find(|name| !seen.insert(*name))
        .map(str::to_owned)
}

fn duplicate_stage_error(name: &str) -> SolverError {
    SolverError::InvalidState(format!("duplicate stage name '{name}'"))
}

#[cfg(test)]
mod tests;
