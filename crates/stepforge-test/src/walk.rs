//! Random walk fixture with a soft convergence criterion.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use stepforge_core::{Circle, Coord, GraphicsObject, Point, Result, SolverState, StepSolver};

/// Walks toward `target` with seeded noise.
///
/// Solves when within `tolerance` of the target. When the budget runs out,
/// final acceptance solves it anyway if within `acceptance_tolerance`.
#[derive(Debug)]
pub struct RandomWalkSolver {
    state: SolverState,
    rng: StdRng,
    position: f64,
    target: f64,
    tolerance: f64,
    acceptance_tolerance: f64,
    best_distance: f64,
}

#[derive(Serialize)]
struct WalkStats {
    position: f64,
    best_distance: f64,
}

impl RandomWalkSolver {
    pub fn new(target: f64, tolerance: f64, acceptance_tolerance: f64, seed: u64) -> Self {
        Self {
            state: SolverState::new(),
            rng: StdRng::seed_from_u64(seed),
            position: 0.0,
            target,
            tolerance,
            acceptance_tolerance,
            best_distance: target.abs(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.state.set_max_iterations(max_iterations);
        self
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    fn distance(&self) -> f64 {
        (self.target - self.position).abs()
    }
}

impl StepSolver for RandomWalkSolver {
    type Output = f64;

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn on_step(&mut self) -> Result<()> {
        let direction = (self.target - self.position).signum();
        let noise: f64 = self.rng.random_range(-1.0..1.0);
        self.position += direction * 0.5 + noise;

        self.best_distance = self.best_distance.min(self.distance());
        self.state.record_stats(&WalkStats {
            position: self.position,
            best_distance: self.best_distance,
        })?;

        if self.distance() < self.tolerance {
            self.state.mark_solved();
        }
        Ok(())
    }

    fn try_final_acceptance(&mut self) {
        if self.distance() <= self.acceptance_tolerance {
            self.state.mark_solved();
        }
    }

    fn render(&self) -> GraphicsObject {
        GraphicsObject {
            points: vec![Point::new(self.position, 0.0).with_color("green")],
            circles: vec![Circle::new(Coord::new(self.target, 0.0), self.tolerance)],
            ..GraphicsObject::default()
        }
    }

    fn output(&self) -> Option<f64> {
        Some(self.position)
    }
}
