//! Test utilities for stepforge-solver
//!
//! Pipeline assembly helpers over the plain fixtures in stepforge-test.

use crate::pipeline::{PipelineSolver, StageDefinition};

use stepforge_test::{SumInput, ValidateInput, ValidateSolver};

pub use stepforge_test::{
    CounterSolver, DoubleSolver, Doubled, FaultySolver, SolveThenFaultSolver, StallingSolver,
    SumSolver, Validation,
};

/// Doubles the input, validates the doubled values against `[0, 10]`, then
/// sums them scaled by the validation pass rate.
pub fn arithmetic_pipeline(values: Vec<f64>) -> PipelineSolver<Vec<f64>> {
    PipelineSolver::new(
        values,
        vec![
            StageDefinition::new::<DoubleSolver, _>("double", |p: &PipelineSolver<Vec<f64>>| {
                Ok(p.input().clone())
            }),
            StageDefinition::new::<ValidateSolver, _>("validate", |p| {
                let doubled = p.require_output::<Doubled>("double")?;
                Ok(ValidateInput {
                    values: doubled.values.clone(),
                    min: 0.0,
                    max: 10.0,
                })
            }),
            StageDefinition::new::<SumSolver, _>("sum", |p| {
                let doubled = p.require_output::<Doubled>("double")?;
                let validation = p.require_output::<Validation>("validate")?;
                Ok(SumInput {
                    values: doubled.values.clone(),
                    scale: validation.pass_rate(),
                })
            }),
        ],
    )
}

/// One counter stage per target, named `stage0`, `stage1`, ...
pub fn counter_pipeline(targets: Vec<u64>) -> PipelineSolver<Vec<u64>> {
    let stages = (0..targets.len())
        .map(|index| {
            StageDefinition::new::<CounterSolver, _>(
                format!("stage{index}"),
                move |p: &PipelineSolver<Vec<u64>>| Ok(p.input()[index]),
            )
        })
        .collect();
    PipelineSolver::new(targets, stages)
}

/// A counter stage, then a stage that faults on its `fail_at`th step, then
/// another counter stage that must never be built.
pub fn failing_pipeline(fail_at: u64) -> PipelineSolver<u64> {
    PipelineSolver::new(
        fail_at,
        vec![
            StageDefinition::new::<CounterSolver, _>("warmup", |_| Ok(2)),
            StageDefinition::new::<FaultySolver, _>("explode", |p| {
                Ok((*p.input(), "bad gradient".to_string()))
            }),
            StageDefinition::new::<CounterSolver, _>("unreached", |_| Ok(1)),
        ],
    )
}
