//! Stage lifecycle events for pipeline monitoring.
//!
//! Pipelines notify registered listeners when a stage's solver is created,
//! when it solves and when it fails. Listeners are called synchronously on
//! the stepping thread, in registration order.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stepforge_solver::event::{StageEventSupport, StageLifecycleListener};
//!
//! #[derive(Debug)]
//! struct PrintStages;
//!
//! impl StageLifecycleListener for PrintStages {
//!     fn on_stage_started(&self, stage_index: usize, stage_name: &str) {
//!         println!("stage {stage_index} ({stage_name}) started");
//!     }
//!
//!     fn on_stage_completed(&self, stage_index: usize, stage_name: &str, time_spent: Duration) {
//!         println!("stage {stage_index} ({stage_name}) took {time_spent:?}");
//!     }
//! }
//!
//! let mut support = StageEventSupport::new();
//! support.add_listener(Arc::new(PrintStages));
//! assert_eq!(support.listener_count(), 1);
//! ```

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

/// Listener for pipeline stage transitions.
pub trait StageLifecycleListener: Send + Sync + Debug {
    /// Called when a stage's solver has been created.
    ///
    /// # Arguments
    ///
    /// * `stage_index` - The index of the stage (0-based)
    /// * `stage_name` - The stage's name
    fn on_stage_started(&self, stage_index: usize, stage_name: &str);

    /// Called when a stage's solver reports solved.
    fn on_stage_completed(&self, stage_index: usize, stage_name: &str, time_spent: Duration);

    /// Called when a stage's solver fails, ending the pipeline.
    fn on_stage_failed(&self, _stage_index: usize, _stage_name: &str, _error: &str) {}
}

/// Broadcaster for stage events.
#[derive(Default)]
pub struct StageEventSupport {
    listeners: Vec<Arc<dyn StageLifecycleListener>>,
}

impl StageEventSupport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn StageLifecycleListener>) {
        self.listeners.push(listener);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn fire_stage_started(&self, stage_index: usize, stage_name: &str) {
        for listener in &self.listeners {
            listener.on_stage_started(stage_index, stage_name);
        }
    }

    pub fn fire_stage_completed(&self, stage_index: usize, stage_name: &str, time_spent: Duration) {
        for listener in &self.listeners {
            listener.on_stage_completed(stage_index, stage_name, time_spent);
        }
    }

    pub fn fire_stage_failed(&self, stage_index: usize, stage_name: &str, error: &str) {
        for listener in &self.listeners {
            listener.on_stage_failed(stage_index, stage_name, error);
        }
    }
}

impl Debug for StageEventSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageEventSupport")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A listener that logs stage events through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventListener {
    /// Prefix for log messages.
    prefix: String,
}

impl LoggingEventListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl StageLifecycleListener for LoggingEventListener {
    fn on_stage_started(&self, stage_index: usize, stage_name: &str) {
        info!("{}[Event] Stage {} ({}) started", self.prefix, stage_index, stage_name);
    }

    fn on_stage_completed(&self, stage_index: usize, stage_name: &str, time_spent: Duration) {
        info!(
            "{}[Event] Stage {} ({}) completed in {:?}",
            self.prefix, stage_index, stage_name, time_spent
        );
    }

    fn on_stage_failed(&self, stage_index: usize, stage_name: &str, error: &str) {
        info!(
            "{}[Event] Stage {} ({}) failed: {}",
            self.prefix, stage_index, stage_name, error
        );
    }
}

/// A listener that counts stage events.
#[derive(Debug, Default)]
pub struct CountingEventListener {
    started: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl CountingEventListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.started.store(0, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
    }
}

impl StageLifecycleListener for CountingEventListener {
    fn on_stage_started(&self, _stage_index: usize, _stage_name: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stage_completed(&self, _stage_index: usize, _stage_name: &str, _time_spent: Duration) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stage_failed(&self, _stage_index: usize, _stage_name: &str, _error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
