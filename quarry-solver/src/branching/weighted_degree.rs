use crate::branching::unfixed_variables;
use crate::branching::Brancher;
use crate::branching::Decision;
use crate::engine::Model;

/// Branches on the variable with the highest failure weight relative to its
/// domain size. The model accumulates one weight unit per variable in the
/// scope of every failing propagator, so frequently conflicting variables
/// rise to the front as the search proceeds.
pub struct WeightedDegree;

impl Brancher for WeightedDegree {
    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let store = model.store();
        unfixed_variables(model)
            .into_iter()
            .map(|variable| {
                let score = (model.failure_weight(variable) + 1.0) / store.size(variable) as f64;
                (variable, score)
            })
            .max_by(|first, second| first.1.total_cmp(&second.1))
            .map(|(variable, _)| Decision {
                variable,
                value: store.min(variable),
            })
    }
}
