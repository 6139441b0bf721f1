use fnv::FnvHashMap;

use crate::branching::unfixed_variables;
use crate::branching::Brancher;
use crate::branching::Decision;
use crate::engine::Model;
use crate::engine::VariableId;

/// Branches on the variable whose assignments shrink the search space the
/// most, using impact priors probed once before the search starts.
///
/// The prior of a variable is the mean impact of assigning each of its
/// values at the root, where the impact of one assignment is
/// `1 - space_after / space_before` over the product of domain sizes
/// (computed in log space) and a failed assignment counts as impact 1.
pub struct ImpactBased {
    priors: FnvHashMap<VariableId, f64>,
}

impl ImpactBased {
    pub fn new() -> ImpactBased {
        ImpactBased {
            priors: FnvHashMap::default(),
        }
    }
}

impl Default for ImpactBased {
    fn default() -> ImpactBased {
        ImpactBased::new()
    }
}

fn log_space(model: &Model, variables: &[VariableId]) -> f64 {
    variables
        .iter()
        .map(|&variable| (model.store().size(variable) as f64).ln())
        .sum()
}

impl Brancher for ImpactBased {
    fn initialise(&mut self, model: &mut Model) {
        let variables = unfixed_variables(model);
        for &variable in &variables {
            let values = model.store().values(variable);
            let before = log_space(model, &variables);
            let mut total = 0.0;
            for value in &values {
                model.push_state();
                let consistent =
                    model.assign(variable, *value).is_ok() && model.propagate().is_ok();
                if consistent {
                    let after = log_space(model, &variables);
                    total += 1.0 - (after - before).exp();
                } else {
                    total += 1.0;
                }
                model.pop_state();
            }
            let _ = self
                .priors
                .insert(variable, total / values.len() as f64);
        }
    }

    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let variable = unfixed_variables(model)
            .into_iter()
            .map(|variable| (variable, self.priors.get(&variable).copied().unwrap_or(0.0)))
            .max_by(|first, second| first.1.total_cmp(&second.1))
            .map(|(variable, _)| variable)?;
        Some(Decision {
            variable,
            value: model.store().min(variable),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ImpactBased;
    use crate::branching::Brancher;
    use crate::engine::Domain;
    use crate::engine::Model;
    use crate::propagators::AllDifferent;

    #[test]
    fn probing_prefers_the_constrained_variable() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 1));
        let y = model.new_variable("y", Domain::interval(0, 1));
        let _ = model.new_variable("free", Domain::interval(0, 1));
        model.post(Box::new(AllDifferent::new(vec![x, y])));

        let mut brancher = ImpactBased::new();
        brancher.initialise(&mut model);
        let decision = brancher.next_decision(&model).unwrap();
        assert!(decision.variable == x || decision.variable == y);
    }

    #[test]
    fn probing_restores_the_root_state() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 4));

        let mut brancher = ImpactBased::new();
        brancher.initialise(&mut model);
        assert_eq!(model.depth(), 0);
        assert_eq!(model.store().size(x), 5);
    }
}
