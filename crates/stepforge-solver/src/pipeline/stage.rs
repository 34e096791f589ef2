//! Stage definitions and the outputs they accumulate.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::time::{Duration, Instant};

use stepforge_core::{short_type_name, FromInput, Result, SharedOutput, Solver, StepSolver};

use super::PipelineSolver;

type BuildFn<P> = dyn Fn(&PipelineSolver<P>) -> Result<Box<dyn Solver>> + Send + Sync;
type CompleteFn<P> = dyn Fn(&mut PipelineSolver<P>) + Send + Sync;

/// Static descriptor of one pipeline stage.
///
/// Binds a stage name to a child solver type and to the function deriving
/// that child's input from the pipeline (its input problem and the outputs
/// of earlier stages).
///
/// # Example
///
/// ```
/// use stepforge_solver::pipeline::StageDefinition;
/// use stepforge_test::CounterSolver;
///
/// let stage: StageDefinition<u64> =
///     StageDefinition::new::<CounterSolver, _>("count", |pipeline| Ok(*pipeline.input()))
///         .on_complete(|pipeline| {
///             pipeline.stats_mut().insert("counted".into(), true.into());
///         });
///
/// assert_eq!(stage.name(), "count");
/// assert_eq!(stage.solver_type(), "CounterSolver");
/// ```
pub struct StageDefinition<P> {
    name: String,
    solver_type: &'static str,
    build: Box<BuildFn<P>>,
    on_complete: Option<Box<CompleteFn<P>>>,
}

impl<P: 'static> StageDefinition<P> {
    /// Creates a stage that builds a `C` from the input `derive_input` returns.
    pub fn new<C, F>(name: impl Into<String>, derive_input: F) -> Self
    where
        C: FromInput,
        F: Fn(&PipelineSolver<P>) -> Result<C::Input> + Send + Sync + 'static,
    {
        Self::with_solver::<C, _>(name, move |pipeline| {
            derive_input(pipeline).map(C::from_input)
        })
    }

    /// Creates a stage whose solver is built directly by `build`.
    ///
    /// Use this for solvers without a [`FromInput`] impl, such as a nested
    /// [`PipelineSolver`] carrying its own stage list.
    pub fn with_solver<C, F>(name: impl Into<String>, build: F) -> Self
    where
        C: StepSolver,
        F: Fn(&PipelineSolver<P>) -> Result<C> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            solver_type: short_type_name(std::any::type_name::<C>()),
            build: Box::new(move |pipeline| Ok(Box::new(build(pipeline)?) as Box<dyn Solver>)),
            on_complete: None,
        }
    }

    /// Sets a callback run once when this stage's solver reports solved.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut PipelineSolver<P>) + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl<P> StageDefinition<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unqualified type name of the child solver.
    pub fn solver_type(&self) -> &'static str {
        self.solver_type
    }

    pub(crate) fn build(&self, pipeline: &PipelineSolver<P>) -> Result<Box<dyn Solver>> {
        (self.build)(pipeline)
    }

    pub(crate) fn completion(&self) -> Option<&CompleteFn<P>> {
        self.on_complete.as_deref()
    }
}

impl<P> Debug for StageDefinition<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDefinition")
            .field("name", &self.name)
            .field("solver_type", &self.solver_type)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Outputs of completed stages, keyed by stage name.
///
/// Outputs are shared, so cloning the map is a shallow copy.
#[derive(Clone, Default)]
pub struct StageOutputs {
    outputs: HashMap<String, SharedOutput>,
}

impl StageOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the output of `name` if present and of type `T`.
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.outputs
            .get(name)
            .and_then(|output| output.downcast_ref::<T>())
    }

    /// Returns the type-erased output of `name`.
    pub fn get_shared(&self, name: &str) -> Option<&SharedOutput> {
        self.outputs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, output: SharedOutput) {
        self.outputs.insert(name.into(), output);
    }
}

impl Debug for StageOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("StageOutputs")
            .field("stages", &names)
            .finish()
    }
}

/// Timing markers for one stage.
#[derive(Debug, Clone, Default)]
pub struct StageTiming {
    /// When the stage's solver was created.
    pub start_time: Option<Instant>,
    /// When the stage's solver solved or failed.
    pub end_time: Option<Instant>,
    /// Recorded duration; zero until the stage completes.
    pub time_spent: Duration,
    /// Pipeline iteration on which the stage's solver was created.
    pub first_iteration: Option<u64>,
}

impl StageTiming {
    pub(crate) fn started(iteration: u64) -> Self {
        Self {
            start_time: Some(Instant::now()),
            end_time: None,
            time_spent: Duration::ZERO,
            first_iteration: Some(iteration),
        }
    }

    pub(crate) fn finish(&mut self) {
        let now = Instant::now();
        self.end_time = Some(now);
        if let Some(start) = self.start_time {
            self.time_spent = now.duration_since(start);
        }
    }

    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Time spent so far: the recorded duration once finished, the running
    /// time while active, zero before start.
    pub fn elapsed(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(_), Some(_)) => self.time_spent,
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }
}
