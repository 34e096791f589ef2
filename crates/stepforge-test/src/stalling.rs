//! Non-converging fixture.

use stepforge_core::{Result, SolverState, StepSolver};

/// Never solves on its own.
///
/// With `accept_on_budget` set, final acceptance declares it solved when
/// the iteration budget runs out.
#[derive(Debug)]
pub struct StallingSolver {
    state: SolverState,
    accept_on_budget: bool,
}

impl StallingSolver {
    pub fn new(max_iterations: u64) -> Self {
        Self {
            state: SolverState::with_max_iterations(max_iterations),
            accept_on_budget: false,
        }
    }

    pub fn accepting(max_iterations: u64) -> Self {
        Self {
            state: SolverState::with_max_iterations(max_iterations),
            accept_on_budget: true,
        }
    }
}

impl StepSolver for StallingSolver {
    type Output = ();

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn on_step(&mut self) -> Result<()> {
        Ok(())
    }

    fn try_final_acceptance(&mut self) {
        if self.accept_on_budget {
            self.state.mark_solved();
        }
    }
}
