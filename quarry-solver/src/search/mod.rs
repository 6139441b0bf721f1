//! Backtracking search over a propagation model.
//!
//! Both searches use an explicit frame stack instead of native recursion,
//! with exactly one domain checkpoint per frame, so tree depth is bounded
//! by memory rather than the host stack. Branching is binary: the left
//! branch assigns the brancher's decision, the right branch removes it.

mod dfs;
mod lds;

use log::debug;

use crate::basic_types::SearchStatistics;
use crate::basic_types::Solution;
use crate::basic_types::Stopwatch;
use crate::branching::Brancher;
use crate::branching::Decision;
use crate::engine::Inconsistency;
use crate::engine::Model;

/// How the search tree is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    DepthFirst,
    LimitedDiscrepancy,
}

/// Randomized-restart configuration for depth-first search: abandon the
/// current tree once the failure cutoff is reached and start over with the
/// cutoff scaled by the growth factor.
#[derive(Debug, Clone, Copy)]
pub struct RestartOptions {
    pub enabled: bool,
    pub failure_cutoff: u64,
    pub growth_factor: f64,
}

impl Default for RestartOptions {
    fn default() -> RestartOptions {
        RestartOptions {
            enabled: false,
            failure_cutoff: 100,
            growth_factor: 1.5,
        }
    }
}

/// Why one search run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    CutoffReached,
    DeadlineReached,
}

/// The exported outcome of one worker's search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub statistics: SearchStatistics,
    pub solutions: Vec<Solution>,
}

/// Runs the configured search to exhaustion or the deadline. Solutions are
/// collected in discovery order; on an optimization model each solution
/// tightens the objective bound for the rest of the run.
pub fn run_search(
    model: &mut Model,
    brancher: &mut dyn Brancher,
    mode: SearchMode,
    restart: &RestartOptions,
    deadline: Stopwatch,
) -> SearchResult {
    let mut statistics = SearchStatistics::default();
    let mut solutions = Vec::new();
    if model.is_failed() {
        statistics.completed = true;
        return SearchResult {
            statistics,
            solutions,
        };
    }
    brancher.initialise(model);
    let mut bound = None;
    let outcome = match mode {
        SearchMode::LimitedDiscrepancy => lds::run(
            model,
            brancher,
            deadline,
            &mut statistics,
            &mut solutions,
            &mut bound,
        ),
        SearchMode::DepthFirst if restart.enabled => {
            let mut cutoffs =
                GeometricSequence::new(restart.failure_cutoff, restart.growth_factor);
            loop {
                let cutoff = cutoffs.next_cutoff();
                let outcome = dfs::run(
                    model,
                    brancher,
                    deadline,
                    Some(cutoff),
                    &mut statistics,
                    &mut solutions,
                    &mut bound,
                );
                if outcome != RunOutcome::CutoffReached {
                    break outcome;
                }
                debug!("restart after {cutoff} failures");
            }
        }
        SearchMode::DepthFirst => dfs::run(
            model,
            brancher,
            deadline,
            None,
            &mut statistics,
            &mut solutions,
            &mut bound,
        ),
    };
    statistics.completed = outcome == RunOutcome::Completed;
    SearchResult {
        statistics,
        solutions,
    }
}

/// One choice point. The frame owns the checkpoint pushed just before its
/// branch was applied.
pub(crate) struct Frame {
    pub(crate) decision: Decision,
    pub(crate) explored_right: bool,
}

impl Frame {
    pub(crate) fn new(decision: Decision) -> Frame {
        Frame {
            decision,
            explored_right: false,
        }
    }
}

/// Applies the current objective bound, then propagates to a fixpoint.
pub(crate) fn settle(model: &mut Model, bound: &Option<i32>) -> Result<(), Inconsistency> {
    if let (Some(objective), Some(bound)) = (model.objective(), *bound) {
        model.remove_above(objective.minimized, bound)?;
    }
    model.propagate()
}

/// Records the solution at the current (fully fixed) node and tightens the
/// objective bound.
pub(crate) fn record_solution(
    model: &Model,
    statistics: &mut SearchStatistics,
    solutions: &mut Vec<Solution>,
    bound: &mut Option<i32>,
) {
    statistics.solutions += 1;
    let store = model.store();
    let values = model
        .declared_variables()
        .iter()
        .map(|&variable| store.min(variable))
        .collect();
    let objective_value = model
        .objective()
        .map(|objective| store.min(objective.reported));
    solutions.push(Solution::new(values, objective_value));
    if let Some(objective) = model.objective() {
        *bound = Some(store.min(objective.minimized) - 1);
    }
}

/// Pops every checkpoint still owned by the stack.
pub(crate) fn unwind(model: &mut Model, frames: usize) {
    for _ in 0..frames {
        model.pop_state();
    }
}

/// Restart cutoffs: a geometrically growing integer sequence.
pub(crate) struct GeometricSequence {
    current: f64,
    growth: f64,
}

impl GeometricSequence {
    pub(crate) fn new(start: u64, growth: f64) -> GeometricSequence {
        GeometricSequence {
            current: start as f64,
            growth,
        }
    }

    pub(crate) fn next_cutoff(&mut self) -> u64 {
        let cutoff = (self.current.round() as u64).max(1);
        self.current *= self.growth;
        cutoff
    }
}
