//! Tests for the pipeline solver.

use std::sync::Arc;

use stepforge_core::{SolverKind, StepSolver, DEFAULT_PIPELINE_MAX_ITERATIONS};

use super::*;
use crate::event::CountingEventListener;
use crate::test_utils::{
    arithmetic_pipeline, counter_pipeline, failing_pipeline, CounterSolver, DoubleSolver, Doubled,
    FaultySolver, SolveThenFaultSolver, StallingSolver, SumSolver, Validation,
};

#[test]
fn test_arithmetic_pipeline_yields_twelve() {
    let mut pipeline = arithmetic_pipeline(vec![1.0, 2.0, 3.0]);
    pipeline.solve().unwrap();

    assert!(pipeline.state().is_solved());
    assert!(!pipeline.state().is_failed());
    let doubled = pipeline.stage_output::<Doubled>("double").unwrap();
    assert_eq!(doubled.values, vec![2.0, 4.0, 6.0]);
    assert_eq!(doubled.sum, 12.0);
    let validation = pipeline.stage_output::<Validation>("validate").unwrap();
    assert_eq!(validation.valid_count, 3);
    assert_eq!(pipeline.stage_output::<f64>("sum"), Some(&12.0));
}

#[test]
fn test_each_outer_step_is_one_iteration() {
    let mut pipeline = arithmetic_pipeline(vec![1.0, 2.0, 3.0]);
    pipeline.solve().unwrap();

    // Per stage: one creation step plus three child steps; then one final step.
    assert_eq!(pipeline.state().iterations(), 13);
    assert_eq!(pipeline.solver::<DoubleSolver>("double").unwrap().state().iterations(), 3);
}

#[test]
fn test_stage_output_available_after_first_stage() {
    let mut pipeline = arithmetic_pipeline(vec![1.0, 2.0, 3.0]);
    assert!(!pipeline.has_stage_output("double"));
    assert!(pipeline.stage_solver("double").is_none());

    while !pipeline.has_stage_output("double") {
        pipeline.step().unwrap();
    }

    let child = pipeline.solver::<DoubleSolver>("double").unwrap();
    assert!(child.state().is_solved());
    assert_eq!(pipeline.stage_output::<Doubled>("double"), child.output().as_ref());
    assert!(!pipeline.has_stage_output("validate"));
    assert_eq!(pipeline.current_stage(), Some("validate"));
}

#[test]
fn test_stage_output_wrong_type_is_none() {
    let mut pipeline = arithmetic_pipeline(vec![1.0]);
    pipeline.solve().unwrap();

    assert!(pipeline.has_stage_output("sum"));
    assert!(pipeline.stage_output::<u64>("sum").is_none());
    assert!(matches!(
        pipeline.require_output::<f64>("missing"),
        Err(SolverError::MissingStageOutput(name)) if name == "missing"
    ));
}

#[test]
fn test_all_outputs_has_one_entry_per_stage() {
    let mut pipeline = arithmetic_pipeline(vec![4.0, 5.0]);
    pipeline.solve().unwrap();

    let outputs = pipeline.all_outputs();
    let mut names: Vec<&str> = outputs.names().collect();
    names.sort_unstable();

    assert_eq!(outputs.len(), pipeline.stage_count());
    assert_eq!(names, vec!["double", "sum", "validate"]);
}

#[test]
fn test_validation_scales_sum() {
    // Doubled values [2, 12]; only 2 is inside [0, 10].
    let mut pipeline = arithmetic_pipeline(vec![1.0, 6.0]);
    pipeline.solve().unwrap();

    assert_eq!(pipeline.stage_output::<f64>("sum"), Some(&7.0));
}

#[test]
fn test_stage_progress() {
    let mut pipeline = arithmetic_pipeline(vec![1.0, 2.0, 3.0]);
    assert_eq!(pipeline.stage_progress(), 0.0);

    // The first step only builds stage 0; its child has not progressed yet.
    pipeline.step().unwrap();
    assert_eq!(pipeline.current_stage(), Some("double"));
    assert!(pipeline.stage_solver("double").is_some());
    assert_eq!(pipeline.stage_progress(), 0.0);

    pipeline.step().unwrap();
    let progress = pipeline.stage_progress();
    assert!(progress > 0.0 && progress < 1.0);

    let mut last = progress;
    while pipeline.current_stage_index() < pipeline.stage_count() - 1 {
        pipeline.step().unwrap();
        let progress = pipeline.stage_progress();
        assert!(progress > 0.0 && progress < 1.0);
        assert!(progress >= last);
        last = progress;
    }

    pipeline.solve().unwrap();
    assert_eq!(pipeline.stage_progress(), 1.0);
    assert_eq!(pipeline.state().progress(), 1.0);
}

#[test]
fn test_child_fault_fails_pipeline() {
    let mut pipeline = failing_pipeline(2);
    let err = pipeline.solve().unwrap_err();

    let child_error = pipeline
        .solver::<FaultySolver>("explode")
        .unwrap()
        .state()
        .error()
        .unwrap()
        .to_string();
    assert_eq!(child_error, "FaultySolver error: bad gradient");
    assert!(pipeline.state().is_failed());
    assert!(!pipeline.state().is_solved());
    assert_eq!(pipeline.state().error(), Some(child_error.as_str()));
    assert_eq!(err.to_string(), child_error);
    assert!(pipeline.stage_solver("unreached").is_none());
    assert!(pipeline.state().time_to_solve().is_some());
}

#[test]
fn test_failed_pipeline_step_is_noop() {
    let mut pipeline = failing_pipeline(1);
    assert!(pipeline.solve().is_err());
    let iterations = pipeline.state().iterations();

    pipeline.step().unwrap();
    pipeline.step().unwrap();

    assert_eq!(pipeline.state().iterations(), iterations);
    assert!(pipeline.stage_solver("unreached").is_none());
    assert_eq!(pipeline.current_stage(), Some("explode"));
}

#[test]
fn test_child_budget_exhaustion_fails_pipeline_gracefully() {
    let mut pipeline = PipelineSolver::new(
        (),
        vec![
            StageDefinition::with_solver::<StallingSolver, _>("stall", |_| {
                Ok(StallingSolver::new(3))
            }),
            StageDefinition::new::<CounterSolver, _>("after", |_| Ok(1)),
        ],
    );

    pipeline.solve().unwrap();

    assert!(pipeline.state().is_failed());
    assert_eq!(
        pipeline.state().error(),
        Some("StallingSolver ran out of iterations")
    );
    assert!(pipeline.stage_solver("after").is_none());
}

#[test]
fn test_stage_without_output_still_advances() {
    let mut pipeline = PipelineSolver::new(
        (),
        vec![
            StageDefinition::with_solver::<StallingSolver, _>("soft", |_| {
                Ok(StallingSolver::accepting(4))
            }),
            StageDefinition::new::<CounterSolver, _>("count", |_| Ok(1)),
        ],
    );

    pipeline.solve_until_stage("count").unwrap();

    let soft = pipeline.solver::<StallingSolver>("soft").unwrap();
    assert!(soft.state().is_solved());
    assert!(soft.output().is_none());
    assert!(!pipeline.has_stage_output("soft"));
    assert!(!pipeline.all_outputs().contains("soft"));
    assert_eq!(pipeline.current_stage_index(), 1);
    assert!(pipeline.stage_stats()[0].completed);

    pipeline.solve().unwrap();

    assert!(pipeline.state().is_solved());
    assert!(!pipeline.has_stage_output("soft"));
    assert_eq!(pipeline.stage_output::<u64>("count"), Some(&1));
    assert_eq!(pipeline.all_outputs().len(), 1);
}

#[test]
fn test_child_fault_after_solving_fails_stage() {
    let mut pipeline = PipelineSolver::new(
        (),
        vec![
            StageDefinition::with_solver::<SolveThenFaultSolver, _>("a", |_| {
                Ok(SolveThenFaultSolver::new())
            }),
            StageDefinition::new::<CounterSolver, _>("b", |_| Ok(1)),
        ],
    );

    let err = pipeline.solve().unwrap_err();

    let child = pipeline.solver::<SolveThenFaultSolver>("a").unwrap();
    assert!(child.state().is_failed());
    assert!(!child.state().is_solved());
    let child_error = child.state().error().unwrap().to_string();
    assert_eq!(child_error, "SolveThenFaultSolver error: broke after solving");
    assert_eq!(err.to_string(), child_error);

    assert!(pipeline.state().is_failed());
    assert_eq!(pipeline.state().error(), Some(child_error.as_str()));
    assert!(!pipeline.has_stage_output("a"));
    assert_eq!(pipeline.current_stage_index(), 0);
    assert!(pipeline.stage_solver("b").is_none());
}

#[test]
fn test_try_new_rejects_duplicate_stage_names() {
    let stages = vec![
        StageDefinition::new::<CounterSolver, _>("dup", |_| Ok(1)),
        StageDefinition::new::<CounterSolver, _>("dup", |_| Ok(5)),
    ];

    let err = PipelineSolver::try_new((), stages).unwrap_err();

    assert!(matches!(err, SolverError::InvalidState(_)));
    assert!(err.to_string().contains("duplicate stage name 'dup'"));
}

#[test]
fn test_try_new_accepts_unique_stage_names() {
    let pipeline = PipelineSolver::try_new(
        (),
        vec![
            StageDefinition::new::<CounterSolver, _>("first", |_| Ok(1)),
            StageDefinition::new::<CounterSolver, _>("second", |_| Ok(1)),
        ],
    )
    .unwrap();

    assert_eq!(pipeline.stage_count(), 2);
}

#[test]
fn test_duplicate_stage_names_fail_on_first_step() {
    let mut pipeline = PipelineSolver::new(
        (),
        vec![
            StageDefinition::new::<CounterSolver, _>("dup", |_| Ok(1)),
            StageDefinition::new::<CounterSolver, _>("dup", |_| Ok(5)),
        ],
    );

    let err = pipeline.solve().unwrap_err();

    assert!(pipeline.state().is_failed());
    assert_eq!(pipeline.state().iterations(), 0);
    assert_eq!(pipeline.state().error(), Some(err.to_string().as_str()));
    assert!(err.to_string().contains("duplicate stage name 'dup'"));
    assert!(pipeline.stage_solver("dup").is_none());
    assert!(pipeline.all_outputs().is_empty());
}

#[test]
fn test_missing_input_output_faults_pipeline() {
    let mut pipeline = PipelineSolver::new(
        0u64,
        vec![StageDefinition::new::<CounterSolver, _>("count", |p| {
            p.require_output::<u64>("ghost").copied()
        })],
    )
    .with_name("GhostPipeline");

    let err = pipeline.step().unwrap_err();

    assert!(pipeline.state().is_failed());
    assert_eq!(
        err.to_string(),
        "GhostPipeline error: stage output 'ghost' is not available"
    );
    assert_eq!(pipeline.state().error(), Some(err.to_string().as_str()));
    assert!(pipeline.stage_solver("count").is_none());
}

#[test]
fn test_stage_stats_attribute_iterations() {
    let mut pipeline = counter_pipeline(vec![1, 1, 1]);
    for _ in 0..4 {
        pipeline.step().unwrap();
    }

    let stats = pipeline.stage_stats();
    let iterations: Vec<u64> = stats.iter().map(|s| s.iterations).collect();
    let completed: Vec<bool> = stats.iter().map(|s| s.completed).collect();
    assert_eq!(iterations, vec![2, 1, 0]);
    assert_eq!(completed, vec![true, true, false]);

    pipeline.solve().unwrap();

    assert_eq!(pipeline.state().iterations(), 7);
    let stats = pipeline.stage_stats();
    assert!(stats.iter().all(|s| s.iterations == 2 && s.completed));
    assert_eq!(stats[1].name, "stage1");
    assert_eq!(stats[1].index, 1);
}

#[test]
fn test_stage_timing_recorded() {
    let mut pipeline = counter_pipeline(vec![2, 3]);
    assert!(!pipeline.stage_timing("stage0").unwrap().has_started());

    pipeline.solve().unwrap();

    let timing = pipeline.stage_timing("stage0").unwrap();
    assert_eq!(timing.first_iteration, Some(1));
    assert!(timing.end_time.is_some());
    assert_eq!(timing.elapsed(), timing.time_spent);
    assert_eq!(pipeline.stage_timing("stage1").unwrap().first_iteration, Some(4));
    assert!(pipeline.stage_timing("nope").is_none());
}

#[test]
fn test_stage_stats_published_to_stats() {
    let mut pipeline = counter_pipeline(vec![1, 2, 1]);
    pipeline.solve().unwrap();

    let stats = pipeline.state().stats();
    assert_eq!(stats["current_stage"], 3);
    assert_eq!(stats["stages"].as_array().unwrap().len(), 3);
    assert_eq!(stats["stages"][1]["name"], "stage1");
}

#[test]
fn test_visualize_forwards_to_active_child() {
    let mut pipeline = counter_pipeline(vec![2, 3]);
    pipeline.step().unwrap();
    pipeline.step().unwrap();

    let child = pipeline.stage_solver("stage0").unwrap();
    assert_eq!(pipeline.visualize(), child.visualize());
    assert_eq!(pipeline.preview(), child.preview());
    assert_ne!(pipeline.visualize(), pipeline.preview());
}

#[test]
fn test_visualize_merges_stages_when_done() {
    let mut pipeline = counter_pipeline(vec![2, 3]);
    pipeline.solve().unwrap();

    let merged = pipeline.visualize();

    assert_eq!(merged.points.len(), 2);
    assert_eq!(merged.points[0].stage, Some(0));
    assert_eq!(merged.points[1].stage, Some(1));
    assert!(merged.lines.iter().all(|line| line.stage.is_some()));
    assert_eq!(pipeline.preview(), merged);
}

#[test]
fn test_visualize_single_stage_unmodified() {
    let mut pipeline = counter_pipeline(vec![2]);
    pipeline.solve().unwrap();

    let child = pipeline.stage_solver("stage0").unwrap();
    assert_eq!(pipeline.visualize(), child.visualize());
    assert_eq!(pipeline.visualize().points[0].stage, None);
}

#[test]
fn test_empty_pipeline() {
    let mut pipeline: PipelineSolver<()> = PipelineSolver::new((), Vec::new());
    assert_eq!(pipeline.stage_progress(), 0.0);
    assert!(pipeline.visualize().is_empty());

    pipeline.solve().unwrap();

    assert!(pipeline.state().is_solved());
    assert_eq!(pipeline.state().iterations(), 1);
    assert_eq!(pipeline.stage_progress(), 1.0);
    assert!(pipeline.all_outputs().is_empty());
}

#[test]
fn test_on_complete_runs_before_advance() {
    let mut pipeline = PipelineSolver::new(
        3u64,
        vec![
            StageDefinition::new::<CounterSolver, _>("count", |p| Ok(*p.input())).on_complete(
                |pipeline| {
                    let index = pipeline.current_stage_index();
                    let has_output = pipeline.has_stage_output("count");
                    let stats = pipeline.stats_mut();
                    stats.insert("completed_at".into(), index.into());
                    stats.insert("output_seen".into(), has_output.into());
                },
            ),
            StageDefinition::new::<CounterSolver, _>("again", |_| Ok(1)),
        ],
    );

    pipeline.solve().unwrap();

    let stats = pipeline.state().stats();
    assert_eq!(stats["completed_at"], 0);
    assert_eq!(stats["output_seen"], true);
}

#[test]
fn test_solve_until_stage() {
    let mut pipeline = arithmetic_pipeline(vec![1.0, 2.0, 3.0]);

    pipeline.solve_until_stage("sum").unwrap();

    assert_eq!(pipeline.current_stage(), Some("sum"));
    assert!(pipeline.solver::<SumSolver>("sum").is_some());
    assert!(pipeline.has_stage_output("validate"));
    assert!(!pipeline.state().is_solved());
    assert_eq!(pipeline.state().iterations(), 9);

    // Already past this stage.
    pipeline.solve_until_stage("double").unwrap();
    assert_eq!(pipeline.state().iterations(), 9);
}

#[test]
fn test_solve_until_unknown_stage() {
    let mut pipeline = arithmetic_pipeline(vec![1.0]);

    let err = pipeline.solve_until_stage("polish").unwrap_err();

    assert!(matches!(err, SolverError::UnknownStage(name) if name == "polish"));
    assert_eq!(pipeline.state().iterations(), 0);
}

#[test]
fn test_solve_until_stage_stops_on_failure() {
    let mut pipeline = counter_pipeline(vec![50, 1]).with_max_iterations(10);

    pipeline.solve_until_stage("stage1").unwrap();

    assert!(pipeline.state().is_failed());
    assert_eq!(
        pipeline.state().error(),
        Some("PipelineSolver ran out of iterations")
    );
}

#[test]
fn test_pipeline_budget() {
    let pipeline = counter_pipeline(vec![1]);
    assert_eq!(pipeline.state().max_iterations(), DEFAULT_PIPELINE_MAX_ITERATIONS);

    let mut pipeline = counter_pipeline(vec![10]).with_max_iterations(5);
    pipeline.solve().unwrap();

    assert!(pipeline.state().is_failed());
    assert_eq!(pipeline.state().iterations(), 5);
    assert_eq!(pipeline.solver::<CounterSolver>("stage0").unwrap().count(), 4);
}

#[test]
fn test_nested_pipeline() {
    let mut pipeline = PipelineSolver::new(
        vec![1.0, 2.0, 3.0],
        vec![
            StageDefinition::with_solver::<PipelineSolver<Vec<f64>>, _>(
                "inner",
                |p: &PipelineSolver<Vec<f64>>| {
                    Ok(arithmetic_pipeline(p.input().clone()).with_name("InnerPipeline"))
                },
            ),
            StageDefinition::new::<CounterSolver, _>("report", |p| {
                let inner = p.require_output::<StageOutputs>("inner")?;
                let sum = inner
                    .get::<f64>("sum")
                    .ok_or_else(|| SolverError::MissingStageOutput("inner.sum".into()))?;
                Ok(*sum as u64)
            }),
        ],
    )
    .with_name("OuterPipeline");

    pipeline.solve_until_stage("inner").unwrap();
    pipeline.step().unwrap();
    let active = pipeline.active_sub_solver().unwrap();
    assert_eq!(active.solver_name(), "InnerPipeline");
    assert!(active.kind().is_pipeline());

    pipeline.solve().unwrap();

    let inner = pipeline.stage_output::<StageOutputs>("inner").unwrap();
    assert_eq!(inner.get::<f64>("sum"), Some(&12.0));
    assert_eq!(pipeline.stage_output::<u64>("report"), Some(&12));
    assert!(pipeline
        .solver::<PipelineSolver<Vec<f64>>>("inner")
        .unwrap()
        .state()
        .is_solved());
}

#[test]
fn test_kind_exposes_pipeline_view() {
    let mut pipeline = arithmetic_pipeline(vec![1.0, 2.0]);
    pipeline.step().unwrap();

    let SolverKind::Pipeline(view) = pipeline.kind() else {
        panic!("expected a pipeline kind");
    };
    assert_eq!(view.stage_names(), vec!["double", "validate", "sum"]);
    assert_eq!(view.current_stage(), Some("double"));
    assert_eq!(view.current_stage_index(), 0);
    assert_eq!(view.stage_stats().len(), 3);
    assert_eq!(pipeline.kind().label(), "pipeline");
}

#[test]
fn test_active_sub_solver_cleared_between_stages() {
    let mut pipeline = counter_pipeline(vec![1, 1]);
    assert!(pipeline.active_sub_solver().is_none());

    pipeline.step().unwrap();
    assert_eq!(
        pipeline.active_sub_solver().map(|s| s.solver_name()),
        Some("CounterSolver")
    );

    pipeline.step().unwrap();
    assert!(pipeline.active_sub_solver().is_none());
    assert!(pipeline.stage_solver("stage0").is_some());
}

#[test]
fn test_listeners_receive_stage_events() {
    let listener = Arc::new(CountingEventListener::new());
    let mut pipeline = arithmetic_pipeline(vec![1.0]).with_listener(listener.clone());
    pipeline.solve().unwrap();

    assert_eq!(listener.started_count(), 3);
    assert_eq!(listener.completed_count(), 3);
    assert_eq!(listener.failed_count(), 0);

    let listener = Arc::new(CountingEventListener::new());
    let mut pipeline = failing_pipeline(1);
    pipeline.add_listener(listener.clone());
    assert!(pipeline.solve().is_err());

    assert_eq!(listener.started_count(), 2);
    assert_eq!(listener.completed_count(), 1);
    assert_eq!(listener.failed_count(), 1);
}

#[test]
fn test_stage_definition_metadata() {
    let pipeline = arithmetic_pipeline(vec![]);
    let types: Vec<&str> = pipeline
        .stage_definitions()
        .iter()
        .map(StageDefinition::solver_type)
        .collect();

    assert_eq!(types, vec!["DoubleSolver", "ValidateSolver", "SumSolver"]);
    assert_eq!(pipeline.stage_index("validate"), Some(1));
    assert_eq!(pipeline.stage_index("nope"), None);
}
