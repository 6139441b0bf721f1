//! Splits a model into disjoint subproblems by enumerating consistent
//! assignments to a prefix of the search variables.
//!
//! The planner deepens the prefix iteratively: a geometric estimate picks
//! the shallowest depth whose tuple count can reach the requested target,
//! the surviving tuples are enumerated with full propagation, and the
//! prefix is locked down with a table before the next round. Workers later
//! split the tuple list among themselves and each solves its share.

mod bounded_enumerator;

pub use bounded_enumerator::BoundedEnumerator;
pub use bounded_enumerator::EnumerationStatistics;

use std::ops::ControlFlow;

use log::debug;
use log::warn;

use crate::engine::Model;
use crate::propagators::Table;

/// The outcome of planning: the prefix length and the consistent prefix
/// assignments found. An empty tuple list means the model is infeasible; a
/// single empty tuple means no split was possible and the whole problem is
/// one subproblem.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub depth: usize,
    pub tuples: Vec<Vec<i32>>,
}

/// Enumerates prefix assignments until at least `target` tuples exist or
/// the estimate shows the target is out of reach.
pub fn decompose(model: &mut Model, target: usize) -> Decomposition {
    let variables = model.search_variables();
    let mut depth = 0;
    let mut tuples: Vec<Vec<i32>> = vec![Vec::new()];
    while !model.is_failed() && tuples.len() < target {
        let sizes: Vec<usize> = variables
            .iter()
            .map(|&variable| model.store().size(variable))
            .collect();
        let Some(next) = bounding_depth(tuples.len(), depth, &sizes, target) else {
            warn!(
                "decomposition stops at depth {depth} with {} tuples, target {target} unreachable",
                tuples.len()
            );
            break;
        };
        let mut enumerator = BoundedEnumerator::new(&variables[..next]);
        let mut collected = Vec::new();
        enumerator.enumerate(model, |tuple| {
            collected.push(tuple.to_vec());
            ControlFlow::Continue(())
        });
        debug!(
            "decomposition depth {next}: {} tuples, {} nodes, {} failures",
            collected.len(),
            enumerator.statistics.nodes,
            enumerator.statistics.failures
        );
        depth = next;
        tuples = collected;
        if tuples.is_empty() {
            model.mark_failed();
            break;
        }
        // Lock the prefix to the surviving tuples so deeper rounds and the
        // workers propagate against them.
        model.post(Box::new(Table::new(
            variables[..depth].to_vec(),
            tuples.clone(),
        )));
    }
    Decomposition { depth, tuples }
}

/// Splits the tuples into `workers` contiguous shares whose sizes differ by
/// at most one. Shares may be empty when there are fewer tuples than
/// workers.
pub fn partition(tuples: &[Vec<i32>], workers: usize) -> Vec<Vec<Vec<i32>>> {
    let workers = workers.max(1);
    let base = tuples.len() / workers;
    let extra = tuples.len() % workers;
    let mut shares = Vec::with_capacity(workers);
    let mut offset = 0;
    for worker in 0..workers {
        let size = base + usize::from(worker < extra);
        shares.push(tuples[offset..offset + size].to_vec());
        offset += size;
    }
    shares
}

/// The shallowest depth past `depth` at which the product of domain sizes
/// reaches `target` tuples, or `None` when even the full prefix cannot.
fn bounding_depth(
    tuples_so_far: usize,
    depth: usize,
    sizes: &[usize],
    target: usize,
) -> Option<usize> {
    let mut product = tuples_so_far.max(1);
    for next in depth + 1..sizes.len() {
        product = product.saturating_mul(sizes[next - 1]);
        if product >= target {
            return Some(next);
        }
    }
    None
}
