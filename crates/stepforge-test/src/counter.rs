//! Counter fixture.

use serde::Serialize;
use serde_json::Value;
use stepforge_core::{
    Coord, FromInput, GraphicsObject, Line, Point, Result, SolverState, StepSolver,
};

/// Increments a counter once per step until it reaches `target`.
#[derive(Debug)]
pub struct CounterSolver {
    state: SolverState,
    target: u64,
    count: u64,
}

#[derive(Serialize)]
struct CounterParams {
    target: u64,
}

impl CounterSolver {
    pub fn new(target: u64) -> Self {
        Self {
            state: SolverState::new(),
            target,
            count: 0,
        }
    }

    pub fn with_max_iterations(target: u64, max_iterations: u64) -> Self {
        Self {
            state: SolverState::with_max_iterations(max_iterations),
            target,
            count: 0,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn target(&self) -> u64 {
        self.target
    }
}

impl FromInput for CounterSolver {
    type Input = u64;

    fn from_input(target: u64) -> Self {
        Self::new(target)
    }
}

impl StepSolver for CounterSolver {
    type Output = u64;

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn on_step(&mut self) -> Result<()> {
        self.count += 1;
        if self.count >= self.target {
            self.state.mark_solved();
        }
        Ok(())
    }

    fn compute_progress(&self) -> Option<f64> {
        if self.target == 0 {
            return Some(1.0);
        }
        Some(self.count as f64 / self.target as f64)
    }

    fn render(&self) -> GraphicsObject {
        GraphicsObject {
            points: vec![Point::new(self.count as f64, 0.0).with_label("count")],
            lines: vec![Line::new([
                Coord::new(0.0, 0.0),
                Coord::new(self.target as f64, 0.0),
            ])],
            ..GraphicsObject::default()
        }
    }

    fn render_preview(&self) -> GraphicsObject {
        GraphicsObject {
            points: vec![Point::new(self.count as f64, 0.0)],
            ..GraphicsObject::default()
        }
    }

    fn export_params(&self) -> Result<Value> {
        Ok(serde_json::to_value(CounterParams {
            target: self.target,
        })?)
    }

    fn output(&self) -> Option<u64> {
        Some(self.count)
    }
}
