//! Frame-based stepping for interactive front ends.
//!
//! `solve()` blocks until termination, so a UI that wants to redraw while a
//! solver runs drives it frame by frame instead: each frame advances the
//! solver by a bounded number of steps and captures its preview.

use std::thread;
use std::time::Duration;

use serde::Serialize;
use stepforge_config::AnimationConfig;
use stepforge_core::{GraphicsObject, Result, Solver};
use tracing::trace;

/// What a front end draws after one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Steps taken during this frame.
    pub steps: u64,
    /// Total iterations after this frame.
    pub iterations: u64,
    pub progress: f64,
    pub solved: bool,
    pub failed: bool,
    pub graphics: GraphicsObject,
}

impl Frame {
    pub fn is_terminal(&self) -> bool {
        self.solved || self.failed
    }
}

/// Advances a solver a fixed number of steps per frame.
#[derive(Debug, Clone)]
pub struct Animator {
    steps_per_frame: u64,
    frame_interval: Duration,
}

impl Animator {
    /// Creates an animator with no pause between frames.
    ///
    /// A `steps_per_frame` of zero is treated as one.
    pub fn new(steps_per_frame: u64) -> Self {
        Self {
            steps_per_frame: steps_per_frame.max(1),
            frame_interval: Duration::ZERO,
        }
    }

    pub fn from_config(config: &AnimationConfig) -> Self {
        Self::new(config.steps_per_frame).with_frame_interval(config.frame_interval())
    }

    /// Sets the pause [`run`](Self::run) inserts between frames.
    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    pub fn steps_per_frame(&self) -> u64 {
        self.steps_per_frame
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Steps `solver` up to `steps_per_frame` times, stopping early once it
    /// terminates, and returns the resulting frame.
    ///
    /// A step error is returned as is; the solver has already recorded it.
    pub fn advance(&self, solver: &mut dyn Solver) -> Result<Frame> {
        let mut steps = 0;
        while steps < self.steps_per_frame && !solver.state().is_terminal() {
            solver.step()?;
            steps += 1;
        }

        let state = solver.state();
        trace!(
            event = "frame",
            solver = solver.solver_name(),
            steps,
            iteration = state.iterations(),
        );
        Ok(Frame {
            steps,
            iterations: state.iterations(),
            progress: state.progress(),
            solved: state.is_solved(),
            failed: state.is_failed(),
            graphics: solver.preview(),
        })
    }

    /// Produces frames until `solver` terminates, passing each to `on_frame`.
    ///
    /// Returns the number of frames produced.
    pub fn run<F>(&self, solver: &mut dyn Solver, mut on_frame: F) -> Result<usize>
    where
        F: FnMut(&Frame),
    {
        let mut frames = 0;
        loop {
            let frame = self.advance(solver)?;
            frames += 1;
            on_frame(&frame);
            if frame.is_terminal() {
                return Ok(frames);
            }
            if !self.frame_interval.is_zero() {
                thread::sleep(self.frame_interval);
            }
        }
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::from_config(&AnimationConfig::default())
    }
}

#[cfg(test)]
#[path = "animate_tests.rs"]
mod tests;
