//! StepForge Solver - pipelines and the debugging harness
//!
//! This crate builds on the stepping contract in `stepforge-core`:
//! - `PipelineSolver`: sequences child solvers, passing stage outputs forward
//! - Stage lifecycle events for monitoring pipelines
//! - Chain walking over active sub-solvers
//! - Serializable snapshots for export
//! - Frame-based animation driver for interactive stepping

pub mod animate;
pub mod chain;
pub mod event;
pub mod pipeline;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod test_utils;

pub use animate::{Animator, Frame};
pub use chain::{breadcrumb, solver_chain, ChainLink};
pub use event::{
    CountingEventListener, LoggingEventListener, StageEventSupport, StageLifecycleListener,
};
pub use pipeline::{PipelineSolver, StageDefinition, StageOutputs, StageTiming};
pub use snapshot::SolverSnapshot;
