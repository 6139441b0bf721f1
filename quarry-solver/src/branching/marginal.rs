//! Branchers driven by the pseudo-marginal estimator. All of them re-run
//! the estimator on the live domains at every decision.

use crate::branching::unfixed_variables;
use crate::branching::BeliefOptions;
use crate::branching::Brancher;
use crate::branching::Decision;
use crate::branching::PseudoMarginals;
use crate::engine::Model;
use crate::engine::VariableId;

fn select_by(
    variables: &[VariableId],
    mut score: impl FnMut(VariableId) -> f64,
    maximize: bool,
) -> Option<VariableId> {
    let compare = |first: &(VariableId, f64), second: &(VariableId, f64)| {
        first.1.total_cmp(&second.1)
    };
    let scored = variables.iter().map(|&variable| (variable, score(variable)));
    let picked = if maximize {
        scored.max_by(compare)?
    } else {
        scored.min_by(compare)?
    };
    Some(picked.0)
}

/// Assigns the single most probable value anywhere in the model.
pub struct MaxMarginal {
    options: BeliefOptions,
}

impl MaxMarginal {
    pub fn new(options: BeliefOptions) -> MaxMarginal {
        MaxMarginal { options }
    }
}

impl Brancher for MaxMarginal {
    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let variables = unfixed_variables(model);
        let marginals = PseudoMarginals::estimate(model, &variables, &self.options);
        let variable = select_by(
            &variables,
            |variable| marginals.best_value(variable).map_or(0.0, |(_, p)| p),
            true,
        )?;
        let (value, _) = marginals.best_value(variable)?;
        Some(Decision { variable, value })
    }
}

/// Assigns the single least probable value, exploring long shots first.
pub struct MinMarginal {
    options: BeliefOptions,
}

impl MinMarginal {
    pub fn new(options: BeliefOptions) -> MinMarginal {
        MinMarginal { options }
    }
}

impl Brancher for MinMarginal {
    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let variables = unfixed_variables(model);
        let marginals = PseudoMarginals::estimate(model, &variables, &self.options);
        let variable = select_by(
            &variables,
            |variable| marginals.worst_value(variable).map_or(f64::MAX, |(_, p)| p),
            false,
        )?;
        let (value, _) = marginals.worst_value(variable)?;
        Some(Decision { variable, value })
    }
}

/// Picks the variable whose distribution is most peaked and assigns its
/// most probable value.
pub struct MaxMarginalStrength {
    options: BeliefOptions,
}

impl MaxMarginalStrength {
    pub fn new(options: BeliefOptions) -> MaxMarginalStrength {
        MaxMarginalStrength { options }
    }
}

impl Brancher for MaxMarginalStrength {
    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let variables = unfixed_variables(model);
        let marginals = PseudoMarginals::estimate(model, &variables, &self.options);
        let variable = select_by(
            &variables,
            |variable| marginals.strength(variable).unwrap_or(0.0),
            true,
        )?;
        let (value, _) = marginals.best_value(variable)?;
        Some(Decision { variable, value })
    }
}

/// Picks the variable whose distribution is closest to uniform.
pub struct MinMarginalStrength {
    options: BeliefOptions,
}

impl MinMarginalStrength {
    pub fn new(options: BeliefOptions) -> MinMarginalStrength {
        MinMarginalStrength { options }
    }
}

impl Brancher for MinMarginalStrength {
    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let variables = unfixed_variables(model);
        let marginals = PseudoMarginals::estimate(model, &variables, &self.options);
        let variable = select_by(
            &variables,
            |variable| marginals.strength(variable).unwrap_or(f64::MAX),
            false,
        )?;
        let (value, _) = marginals.best_value(variable)?;
        Some(Decision { variable, value })
    }
}

/// Picks the variable with the lowest distribution entropy and assigns its
/// most probable value.
pub struct MinEntropy {
    options: BeliefOptions,
}

impl MinEntropy {
    pub fn new(options: BeliefOptions) -> MinEntropy {
        MinEntropy { options }
    }
}

impl Brancher for MinEntropy {
    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let variables = unfixed_variables(model);
        let marginals = PseudoMarginals::estimate(model, &variables, &self.options);
        let variable = select_by(
            &variables,
            |variable| marginals.entropy(variable).unwrap_or(f64::MAX),
            false,
        )?;
        let (value, _) = marginals.best_value(variable)?;
        Some(Decision { variable, value })
    }
}

#[cfg(test)]
mod tests {
    use super::MaxMarginal;
    use super::MinEntropy;
    use crate::branching::BeliefOptions;
    use crate::branching::Brancher;
    use crate::engine::Domain;
    use crate::engine::Model;

    #[test]
    fn max_marginal_prefers_a_shared_value() {
        let mut model = Model::new();
        let _ = model.new_variable("x", Domain::sparse([0, 4]));
        let _ = model.new_variable("y", Domain::sparse([1, 4]));
        let _ = model.new_variable("z", Domain::sparse([2, 4]));

        let mut brancher = MaxMarginal::new(BeliefOptions::default());
        let decision = brancher.next_decision(&model).unwrap();
        assert_eq!(decision.value, 4);
    }

    #[test]
    fn min_entropy_prefers_the_narrow_variable() {
        let mut model = Model::new();
        let _ = model.new_variable("x", Domain::interval(0, 9));
        let y = model.new_variable("y", Domain::sparse([3, 5]));

        let mut brancher = MinEntropy::new(BeliefOptions::default());
        let decision = brancher.next_decision(&model).unwrap();
        assert_eq!(decision.variable, y);
    }

    #[test]
    fn fixed_model_yields_no_decision() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 3));
        model.post_assign(x, 1);

        let mut brancher = MaxMarginal::new(BeliefOptions::default());
        assert!(brancher.next_decision(&model).is_none());
    }
}
