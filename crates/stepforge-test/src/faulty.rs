//! Faulting fixture.

use stepforge_core::{FromInput, Result, SolverError, SolverState, StepSolver};

/// Raises a fault with `message` on step number `fail_at`.
#[derive(Debug)]
pub struct FaultySolver {
    state: SolverState,
    fail_at: u64,
    message: String,
}

impl FaultySolver {
    pub fn new(fail_at: u64, message: impl Into<String>) -> Self {
        Self {
            state: SolverState::new(),
            fail_at,
            message: message.into(),
        }
    }
}

impl FromInput for FaultySolver {
    type Input = (u64, String);

    fn from_input((fail_at, message): (u64, String)) -> Self {
        Self::new(fail_at, message)
    }
}

impl StepSolver for FaultySolver {
    type Output = ();

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn on_step(&mut self) -> Result<()> {
        if self.state.iterations() >= self.fail_at {
            return Err(SolverError::fault(self.message.clone()));
        }
        Ok(())
    }
}

/// Marks itself solved and then faults within the same step.
#[derive(Debug, Default)]
pub struct SolveThenFaultSolver {
    state: SolverState,
}

impl SolveThenFaultSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepSolver for SolveThenFaultSolver {
    type Output = u64;

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn on_step(&mut self) -> Result<()> {
        self.state.mark_solved();
        Err(SolverError::fault("broke after solving"))
    }

    fn output(&self) -> Option<u64> {
        Some(self.state.iterations())
    }
}
