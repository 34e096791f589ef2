//! Serializable snapshots of solver state for export.
//!
//! A snapshot records everything an export tool needs about a solver at one
//! moment: identity, counters, termination flags, stats, constructor
//! parameters when the solver supports them, and per-stage statistics for
//! pipelines. The active sub-solver is captured recursively.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use stepforge_core::{Result, Solver, SolverError, SolverKind, StageStats, Stats};

/// Point-in-time record of a solver.
#[derive(Debug, Clone, Serialize)]
pub struct SolverSnapshot {
    pub name: String,
    /// `"plain"` or `"pipeline"`.
    pub kind: &'static str,
    pub iterations: u64,
    pub max_iterations: u64,
    pub solved: bool,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub progress: f64,
    /// Duration of the last `solve()` call in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_solve_ms: Option<u64>,
    pub stats: Stats,
    /// Data to reconstruct the solver; absent when it does not support export.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor_params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_solver: Option<Box<SolverSnapshot>>,
}

impl SolverSnapshot {
    /// Captures `solver` and its chain of active sub-solvers.
    ///
    /// Fails only if the solver's constructor parameters fail for a reason
    /// other than being unsupported.
    pub fn capture(solver: &dyn Solver) -> Result<Self> {
        Self::capture_visited(solver, &mut HashSet::new())
    }

    fn capture_visited(solver: &dyn Solver, visited: &mut HashSet<*const ()>) -> Result<Self> {
        visited.insert(solver as *const dyn Solver as *const ());

        let constructor_params = match solver.constructor_params() {
            Ok(params) => Some(params),
            Err(SolverError::NotImplemented(_)) => None,
            Err(err) => return Err(err),
        };

        let (current_stage, stages) = match solver.kind() {
            SolverKind::Pipeline(view) => (
                view.current_stage().map(str::to_owned),
                view.stage_stats(),
            ),
            SolverKind::Plain => (None, Vec::new()),
        };

        let sub_solver = match solver.active_sub_solver() {
            Some(child) if !visited.contains(&(child as *const dyn Solver as *const ())) => {
                Some(Box::new(Self::capture_visited(child, visited)?))
            }
            _ => None,
        };

        let state = solver.state();
        Ok(Self {
            name: solver.solver_name().to_string(),
            kind: solver.kind().label(),
            iterations: state.iterations(),
            max_iterations: state.max_iterations(),
            solved: state.is_solved(),
            failed: state.is_failed(),
            error: state.error().map(str::to_owned),
            progress: state.progress(),
            time_to_solve_ms: state.time_to_solve().map(|d| d.as_millis() as u64),
            stats: state.stats().clone(),
            constructor_params,
            current_stage,
            stages,
            sub_solver,
        })
    }

    /// Number of solvers captured, counting nested sub-solvers.
    pub fn depth(&self) -> usize {
        1 + self.sub_solver.as_ref().map_or(0, |child| child.depth())
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Renders the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
