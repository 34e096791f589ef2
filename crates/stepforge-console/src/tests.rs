use super::*;

fn visitor(event: &str) -> EventVisitor {
    EventVisitor {
        event: Some(event.to_string()),
        ..EventVisitor::default()
    }
}

#[test]
fn test_format_duration_ms() {
    assert_eq!(format_duration_ms(250), "250ms");
    assert_eq!(format_duration_ms(1500), "1.50s");
    assert_eq!(format_duration_ms(125_000), "2m 5s");
}

#[test]
fn test_unknown_event_is_silent() {
    assert!(format_event(&visitor("frame"), Level::INFO).is_empty());
    assert!(format_event(&EventVisitor::default(), Level::INFO).is_empty());
}

#[test]
fn test_step_only_at_trace() {
    let mut v = visitor("step");
    v.solver = Some("CounterSolver".to_string());
    v.iteration = Some(1234);

    assert!(format_event(&v, Level::DEBUG).is_empty());
    let output = format_event(&v, Level::TRACE);
    assert!(output.contains("CounterSolver"));
    assert!(output.contains("1,234"));
}

#[test]
fn test_format_solve_end() {
    let mut v = visitor("solve_end");
    v.solver = Some("PipelineSolver".to_string());
    v.iterations = Some(1_000_000);
    v.duration_ms = Some(42);
    v.solved = Some(true);

    let output = format_event(&v, Level::INFO);

    assert!(output.contains("PipelineSolver"));
    assert!(output.contains("1,000,000"));
    assert!(output.contains("42ms"));
    assert!(output.contains("SOLVED"));
}

#[test]
fn test_format_stage_failed() {
    let mut v = visitor("stage_failed");
    v.stage = Some("validate".to_string());
    v.stage_index = Some(1);
    v.error = Some("ValidateSolver error: bad bounds".to_string());

    let output = format_event(&v, Level::WARN);

    assert!(output.contains("validate"));
    assert!(output.contains("failed"));
    assert!(output.contains("bad bounds"));
}

#[test]
fn test_format_stage_start_names_solver() {
    let mut v = visitor("stage_start");
    v.stage = Some("double".to_string());
    v.solver = Some("DoubleSolver".to_string());

    let output = format_event(&v, Level::INFO);

    assert!(output.contains("double"));
    assert!(output.contains("DoubleSolver"));
}
