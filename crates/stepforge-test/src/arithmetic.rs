//! Three small solvers that chain into a pipeline.
//!
//! `DoubleSolver` doubles a list of values, `ValidateSolver` counts how many
//! of them fall inside bounds, and `SumSolver` adds them up scaled by a
//! factor. Each processes one value per step.

use serde::Serialize;
use serde_json::Value;
use stepforge_core::{FromInput, GraphicsObject, Point, Result, SolverState, StepSolver, Text};

/// Output of [`DoubleSolver`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doubled {
    pub values: Vec<f64>,
    pub sum: f64,
}

/// Doubles each input value.
#[derive(Debug)]
pub struct DoubleSolver {
    state: SolverState,
    input: Vec<f64>,
    doubled: Vec<f64>,
}

impl DoubleSolver {
    pub fn new(input: Vec<f64>) -> Self {
        Self {
            state: SolverState::new(),
            doubled: Vec::with_capacity(input.len()),
            input,
        }
    }
}

impl FromInput for DoubleSolver {
    type Input = Vec<f64>;

    fn from_input(input: Vec<f64>) -> Self {
        Self::new(input)
    }
}

impl StepSolver for DoubleSolver {
    type Output = Doubled;

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn on_step(&mut self) -> Result<()> {
        if let Some(value) = self.input.get(self.doubled.len()) {
            self.doubled.push(value * 2.0);
        }
        if self.doubled.len() == self.input.len() {
            self.state.mark_solved();
        }
        Ok(())
    }

    fn compute_progress(&self) -> Option<f64> {
        if self.input.is_empty() {
            return Some(1.0);
        }
        Some(self.doubled.len() as f64 / self.input.len() as f64)
    }

    fn render(&self) -> GraphicsObject {
        GraphicsObject {
            points: self
                .doubled
                .iter()
                .enumerate()
                .map(|(i, v)| Point::new(i as f64, *v).with_color("blue"))
                .collect(),
            ..GraphicsObject::default()
        }
    }

    fn export_params(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.input)?)
    }

    fn output(&self) -> Option<Doubled> {
        Some(Doubled {
            values: self.doubled.clone(),
            sum: self.doubled.iter().sum(),
        })
    }
}

/// Input of [`ValidateSolver`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateInput {
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

/// Output of [`ValidateSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Validation {
    pub valid_count: usize,
    pub total: usize,
}

impl Validation {
    /// Fraction of values inside bounds; 1.0 for an empty input.
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.valid_count as f64 / self.total as f64
        }
    }
}

/// Counts values inside `[min, max]`.
#[derive(Debug)]
pub struct ValidateSolver {
    state: SolverState,
    input: ValidateInput,
    checked: usize,
    valid_count: usize,
}

impl ValidateSolver {
    pub fn new(input: ValidateInput) -> Self {
        Self {
            state: SolverState::new(),
            input,
            checked: 0,
            valid_count: 0,
        }
    }
}

impl FromInput for ValidateSolver {
    type Input = ValidateInput;

    fn from_input(input: ValidateInput) -> Self {
        Self::new(input)
    }
}

impl StepSolver for ValidateSolver {
    type Output = Validation;

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn on_step(&mut self) -> Result<()> {
        if let Some(value) = self.input.values.get(self.checked) {
            if (self.input.min..=self.input.max).contains(value) {
                self.valid_count += 1;
            }
            self.checked += 1;
        }
        if self.checked == self.input.values.len() {
            self.state.mark_solved();
        }
        Ok(())
    }

    fn render(&self) -> GraphicsObject {
        GraphicsObject {
            texts: vec![Text::new(
                0.0,
                0.0,
                format!("{}/{} valid", self.valid_count, self.checked),
            )],
            ..GraphicsObject::default()
        }
    }

    fn export_params(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.input)?)
    }

    fn output(&self) -> Option<Validation> {
        Some(Validation {
            valid_count: self.valid_count,
            total: self.input.values.len(),
        })
    }
}

/// Input of [`SumSolver`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumInput {
    pub values: Vec<f64>,
    pub scale: f64,
}

/// Sums values multiplied by `scale`.
#[derive(Debug)]
pub struct SumSolver {
    state: SolverState,
    input: SumInput,
    added: usize,
    total: f64,
}

impl SumSolver {
    pub fn new(input: SumInput) -> Self {
        Self {
            state: SolverState::new(),
            input,
            added: 0,
            total: 0.0,
        }
    }
}

impl FromInput for SumSolver {
    type Input = SumInput;

    fn from_input(input: SumInput) -> Self {
        Self::new(input)
    }
}

impl StepSolver for SumSolver {
    type Output = f64;

    fn solver_state(&self) -> &SolverState {
        &self.state
    }

    fn solver_state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn on_step(&mut self) -> Result<()> {
        if let Some(value) = self.input.values.get(self.added) {
            self.total += value * self.input.scale;
            self.added += 1;
        }
        if self.added == self.input.values.len() {
            self.state.mark_solved();
        }
        Ok(())
    }

    fn export_params(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.input)?)
    }

    fn output(&self) -> Option<f64> {
        Some(self.total)
    }
}
