//! Shared test fixtures for StepForge crates.
//!
//! This crate provides plain solvers for testing. It depends only on
//! `stepforge-core` so that every other crate can use it as a dev-dependency
//! without cycles.
//!
//! - [`counter`] - Counts to a target; the simplest converging solver
//! - [`stalling`] - Never converges, optionally accepting on budget exhaustion
//! - [`faulty`] - Raises a fault at a chosen iteration, or right after solving
//! - [`arithmetic`] - Double/validate/sum stages for pipeline tests
//! - [`walk`] - Seeded random walk with a soft convergence criterion
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! stepforge-test = { workspace = true }
//! ```

pub mod arithmetic;
pub mod counter;
pub mod faulty;
pub mod stalling;
pub mod walk;

pub use arithmetic::{
    DoubleSolver, Doubled, SumInput, SumSolver, ValidateInput, ValidateSolver, Validation,
};
pub use counter::CounterSolver;
pub use faulty::{FaultySolver, SolveThenFaultSolver};
pub use stalling::StallingSolver;
pub use walk::RandomWalkSolver;
