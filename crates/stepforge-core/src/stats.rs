//! Diagnostic statistics.
//!
//! Solvers keep strongly typed statistics internally and box them into the
//! loosely typed [`Stats`] map only at the reporting boundary.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SolverError};

/// Open-ended key/value record of solver-specific diagnostics.
pub type Stats = BTreeMap<String, Value>;

/// Converts a typed statistics record into a [`Stats`] map.
///
/// The record must serialize to a JSON object.
///
/// # Example
///
/// ```
/// use serde::Serialize;
/// use stepforge_core::stats::stats_from;
///
/// #[derive(Serialize)]
/// struct DescentStats { evaluations: u64, best: f64 }
///
/// let stats = stats_from(&DescentStats { evaluations: 12, best: 0.5 }).unwrap();
/// assert_eq!(stats["evaluations"], 12);
/// ```
pub fn stats_from<T: Serialize>(record: &T) -> Result<Stats> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(SolverError::InvalidState(format!(
            "stats must serialize to an object, got {other}"
        ))),
    }
}

/// Statistics for a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStats {
    /// Stage name.
    pub name: String,
    /// Position of the stage in the pipeline (0-based).
    pub index: usize,
    /// Time spent in this stage so far.
    pub time_spent: Duration,
    /// Outer pipeline iterations attributed to this stage.
    pub iterations: u64,
    /// Whether the stage's solver has finished successfully.
    pub completed: bool,
}

impl StageStats {
    /// Returns the time spent in milliseconds.
    pub fn time_spent_ms(&self) -> u64 {
        self.time_spent.as_millis() as u64
    }
}
