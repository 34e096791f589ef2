//! Colorful console output for solver and stage events.
//!
//! Provides a custom `tracing` layer that formats StepForge events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (solve end, stage start/end)
//! - **WARN**: Failures (solver out of iterations or faulted, stage failed)
//! - **DEBUG**: Solve start
//! - **TRACE**: Individual steps

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static SOLVE_START_NANOS: AtomicU64 = AtomicU64::new(0);

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "stepforge_core=info,stepforge_solver=info";

/// Initializes the console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the StepForge banner and sets up tracing.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(SolverConsoleLayer)
            .try_init();
    });
}

// Marks the start of solving for elapsed time tracking.
fn mark_solve_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    SOLVE_START_NANOS.store(nanos, Ordering::Relaxed);
}

// Returns elapsed time since solve start.
fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = SOLVE_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let banner = r#"
 ____  _             _____
/ ___|| |_ ___ _ __ |  ___|__  _ __ __ _  ___
\___ \| __/ _ \ '_ \| |_ / _ \| '__/ _` |/ _ \
 ___) | ||  __/ |_) |  _| (_) | | | (_| |  __/
|____/ \__\___| .__/|_|  \___/|_|  \__, |\___|
              |_|                  |___/
"#;

    let version_line = format!("              v{} - Steppable Solver Debugger\n", VERSION);

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats solver events with colors.
pub struct SolverConsoleLayer;

impl<S: Subscriber> Layer<S> for SolverConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();

        // Accept events from solver crates
        if !target.starts_with("stepforge_core")
            && !target.starts_with("stepforge_solver")
            && !target.starts_with("stepforge::")
        {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let level = *metadata.level();
        let output = format_event(&visitor, level);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    solver: Option<String>,
    stage: Option<String>,
    error: Option<String>,
    stage_index: Option<u64>,
    iteration: Option<u64>,
    iterations: Option<u64>,
    steps: Option<u64>,
    duration_ms: Option<u64>,
    solved: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        match field.name() {
            "event" => self.event = Some(s.trim_matches('"').to_string()),
            "solver" => self.solver = Some(s.trim_matches('"').to_string()),
            "stage" => self.stage = Some(s.trim_matches('"').to_string()),
            "error" => self.error = Some(s.trim_matches('"').to_string()),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "stage_index" => self.stage_index = Some(value),
            "iteration" => self.iteration = Some(value),
            "iterations" => self.iterations = Some(value),
            "steps" => self.steps = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value as u64);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "solved" {
            self.solved = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "solver" => self.solver = Some(value.to_string()),
            "stage" => self.stage = Some(value.to_string()),
            "error" => self.error = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "solve_start" => format_solve_start(v),
        "solve_end" => format_solve_end(v),
        "solver_failed" => format_solver_failed(v),
        "stage_start" => format_stage_start(v),
        "stage_end" => format_stage_end(v),
        "stage_failed" => format_stage_failed(v),
        "step" => format_step(v, level),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn format_solve_start(v: &EventVisitor) -> String {
    mark_solve_start();
    let solver = v.solver.as_deref().unwrap_or("Solver");

    format!(
        "{} {} Solving │ {}",
        format_elapsed(),
        "▶".bright_green().bold(),
        solver.white().bold()
    )
}

fn format_solve_end(v: &EventVisitor) -> String {
    let solver = v.solver.as_deref().unwrap_or("Solver");
    let iterations = v.iterations.unwrap_or(0);
    let duration = v.duration_ms.unwrap_or(0);

    let status = if v.solved.unwrap_or(false) {
        "SOLVED".bright_green().bold().to_string()
    } else {
        "FAILED".bright_red().bold().to_string()
    };

    format!(
        "{} {} {} finished │ {} iterations │ {} │ {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        solver.white().bold(),
        iterations.to_formatted_string(&Locale::en).bright_yellow(),
        format_duration_ms(duration).yellow(),
        status
    )
}

fn format_solver_failed(v: &EventVisitor) -> String {
    let solver = v.solver.as_deref().unwrap_or("Solver");
    let error = v.error.as_deref().unwrap_or("unknown error");

    format!(
        "{} {} {} failed │ {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        solver.white().bold(),
        error.bright_red()
    )
}

fn format_stage_start(v: &EventVisitor) -> String {
    let stage = v.stage.as_deref().unwrap_or("Unknown");
    let index = v.stage_index.unwrap_or(0);

    let mut output = format!(
        "{} {} Stage {} {} started",
        format_elapsed(),
        "▶".bright_blue(),
        index.bright_black(),
        stage.white().bold()
    );

    if let Some(ref solver) = v.solver {
        output.push_str(&format!(" │ {}", solver.bright_magenta()));
    }

    output
}

fn format_stage_end(v: &EventVisitor) -> String {
    let stage = v.stage.as_deref().unwrap_or("Unknown");
    let index = v.stage_index.unwrap_or(0);
    let steps = v.steps.unwrap_or(0);
    let duration = v.duration_ms.unwrap_or(0);

    format!(
        "{} {} Stage {} {} ended │ {} │ {} steps",
        format_elapsed(),
        "◀".bright_blue(),
        index.bright_black(),
        stage.white().bold(),
        format_duration_ms(duration).yellow(),
        steps.to_formatted_string(&Locale::en).white(),
    )
}

fn format_stage_failed(v: &EventVisitor) -> String {
    let stage = v.stage.as_deref().unwrap_or("Unknown");
    let index = v.stage_index.unwrap_or(0);
    let error = v.error.as_deref().unwrap_or("unknown error");

    format!(
        "{} {} Stage {} {} failed │ {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        index.bright_black(),
        stage.white().bold(),
        error.bright_red()
    )
}

fn format_step(v: &EventVisitor, level: Level) -> String {
    if level != Level::TRACE {
        return String::new();
    }

    let solver = v.solver.as_deref().unwrap_or("Solver");
    let iteration = v.iteration.unwrap_or(0);

    format!(
        "{} {} {} step {:>10}",
        format_elapsed(),
        "·".bright_black(),
        solver.bright_black(),
        iteration.to_formatted_string(&Locale::en).bright_black(),
    )
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests;
