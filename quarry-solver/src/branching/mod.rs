//! Variable and value ordering strategies.
//!
//! A [`Brancher`] proposes the next decision of a search; the search itself
//! turns it into a binary choice point (assign on the left branch, remove on
//! the right). Strategies form a closed set selected by a [`Heuristic`] tag.

mod first_fail;
mod impact;
mod marginal;
mod pseudo_marginals;
mod weighted_degree;

pub use first_fail::FirstFail;
pub use first_fail::FirstFailRandomValue;
pub use impact::ImpactBased;
pub use marginal::MaxMarginal;
pub use marginal::MaxMarginalStrength;
pub use marginal::MinEntropy;
pub use marginal::MinMarginal;
pub use marginal::MinMarginalStrength;
pub use pseudo_marginals::BeliefOptions;
pub use pseudo_marginals::PseudoMarginals;
pub use weighted_degree::WeightedDegree;

use crate::engine::Model;
use crate::engine::VariableId;

/// One proposed choice point: try `variable = value` first, then
/// `variable != value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub variable: VariableId,
    pub value: i32,
}

/// A variable/value ordering strategy.
pub trait Brancher {
    /// One-time pass over the model before the search starts. Strategies
    /// that need priors (impact probing) override this; the default does
    /// nothing.
    fn initialise(&mut self, _model: &mut Model) {}

    /// The next decision, or [`None`] when every search variable is fixed.
    fn next_decision(&mut self, model: &Model) -> Option<Decision>;
}

/// Strategy tags, one per implemented brancher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Heuristic {
    #[default]
    FirstFail,
    FirstFailRandomValue,
    MaxMarginal,
    MinMarginal,
    MaxMarginalStrength,
    MinMarginalStrength,
    MinEntropy,
    ImpactBased,
    WeightedDegree,
}

/// Instantiates the brancher for a strategy tag. Randomized strategies are
/// seeded deterministically by the caller.
pub fn brancher_for(heuristic: Heuristic, belief: BeliefOptions, seed: u64) -> Box<dyn Brancher> {
    match heuristic {
        Heuristic::FirstFail => Box::new(FirstFail),
        Heuristic::FirstFailRandomValue => Box::new(FirstFailRandomValue::new(seed)),
        Heuristic::MaxMarginal => Box::new(MaxMarginal::new(belief)),
        Heuristic::MinMarginal => Box::new(MinMarginal::new(belief)),
        Heuristic::MaxMarginalStrength => Box::new(MaxMarginalStrength::new(belief)),
        Heuristic::MinMarginalStrength => Box::new(MinMarginalStrength::new(belief)),
        Heuristic::MinEntropy => Box::new(MinEntropy::new(belief)),
        Heuristic::ImpactBased => Box::new(ImpactBased::new()),
        Heuristic::WeightedDegree => Box::new(WeightedDegree),
    }
}

/// The unfixed search variables, in branching order.
pub(crate) fn unfixed_variables(model: &Model) -> Vec<VariableId> {
    model
        .search_variables()
        .into_iter()
        .filter(|&variable| !model.store().is_fixed(variable))
        .collect()
}
