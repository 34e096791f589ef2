//! Config-driven entry points.

use stepforge_config::SolverConfig;
use stepforge_core::{Result, Solver, SolverError};
use stepforge_solver::{Animator, Frame};
use tracing::debug;

/// Configuration file read by [`run_solver`] and [`run_animated`].
pub const CONFIG_FILE: &str = "solver.toml";

/// Solves `solver` to completion using `solver.toml` if present.
///
/// A missing or invalid configuration file falls back to the defaults.
pub fn run_solver(solver: &mut dyn Solver) -> Result<()> {
    let config = SolverConfig::load(CONFIG_FILE).unwrap_or_default();
    run_solver_with_config(solver, &config)
}

/// Solves `solver` to completion under `config`.
///
/// An invalid `config` is rejected before the solver is touched.
pub fn run_solver_with_config(solver: &mut dyn Solver, config: &SolverConfig) -> Result<()> {
    config
        .validate()
        .map_err(|err| SolverError::InvalidState(err.to_string()))?;

    #[cfg(feature = "console")]
    stepforge_console::init();

    apply_config(solver, config);
    solver.solve()
}

/// Steps `solver` frame by frame until it terminates, using the animation
/// settings from `solver.toml` if present.
///
/// Returns the number of frames produced.
pub fn run_animated<F>(solver: &mut dyn Solver, on_frame: F) -> Result<usize>
where
    F: FnMut(&Frame),
{
    let config = SolverConfig::load(CONFIG_FILE).unwrap_or_default();

    #[cfg(feature = "console")]
    stepforge_console::init();

    apply_config(solver, &config);
    Animator::from_config(&config.animation).run(solver, on_frame)
}

/// Applies the configured iteration budget for the solver's kind.
///
/// A budget the configuration leaves unset keeps the solver's own.
pub fn apply_config(solver: &mut dyn Solver, config: &SolverConfig) {
    let configured = if solver.kind().is_pipeline() {
        config.pipeline_max_iterations
    } else {
        config.max_iterations
    };
    if let Some(max_iterations) = configured {
        debug!(
            event = "config_applied",
            solver = solver.solver_name(),
            max_iterations,
        );
        solver.set_max_iterations(max_iterations);
    }
}

#[cfg(test)]
#[path = "solver_tests.rs"]
mod tests;
