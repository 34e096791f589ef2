//! Walking chains of active sub-solvers.
//!
//! A pipeline delegates to its running stage, which may itself be a
//! pipeline. [`solver_chain`] flattens that chain from the outermost solver
//! down to the innermost one, which is what breadcrumb displays and export
//! tools need.

use std::collections::HashSet;

use serde::Serialize;
use stepforge_core::{Solver, SolverKind};

/// One solver in a chain of active sub-solvers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainLink {
    /// Distance from the root solver.
    pub depth: usize,
    pub name: &'static str,
    /// `"plain"` or `"pipeline"`.
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    pub iterations: u64,
    pub solved: bool,
    pub failed: bool,
}

impl ChainLink {
    fn describe(solver: &dyn Solver, depth: usize) -> Self {
        let kind = solver.kind();
        let current_stage = match kind {
            SolverKind::Pipeline(view) => view.current_stage().map(str::to_owned),
            SolverKind::Plain => None,
        };
        let state = solver.state();
        Self {
            depth,
            name: solver.solver_name(),
            kind: kind.label(),
            current_stage,
            iterations: state.iterations(),
            solved: state.is_solved(),
            failed: state.is_failed(),
        }
    }
}

/// Follows `active_sub_solver()` edges from `root`.
///
/// The walk stops at the first solver already visited, so a hand-built
/// chain that loops back on itself yields each solver once.
pub fn solver_chain(root: &dyn Solver) -> Vec<ChainLink> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(root);

    while let Some(solver) = current {
        let address = solver as *const dyn Solver as *const ();
        if !visited.insert(address) {
            break;
        }
        chain.push(ChainLink::describe(solver, chain.len()));
        current = solver.active_sub_solver();
    }
    chain
}

/// Solver names along the chain, joined with `" > "`.
pub fn breadcrumb(root: &dyn Solver) -> String {
    solver_chain(root)
        .iter()
        .map(|link| link.name)
        .collect::<Vec<_>>()
        .join(" > ")
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
