use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::branching::unfixed_variables;
use crate::branching::Brancher;
use crate::branching::Decision;
use crate::engine::Model;

/// Smallest domain first, minimum value first. Ties go to the earlier
/// variable in branching order.
pub struct FirstFail;

impl Brancher for FirstFail {
    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let store = model.store();
        unfixed_variables(model)
            .into_iter()
            .min_by_key(|&variable| store.size(variable))
            .map(|variable| Decision {
                variable,
                value: store.min(variable),
            })
    }
}

/// Smallest domain first, with the value drawn uniformly from the domain.
pub struct FirstFailRandomValue {
    rng: SmallRng,
}

impl FirstFailRandomValue {
    pub fn new(seed: u64) -> FirstFailRandomValue {
        FirstFailRandomValue {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Brancher for FirstFailRandomValue {
    fn next_decision(&mut self, model: &Model) -> Option<Decision> {
        let store = model.store();
        let variable = unfixed_variables(model)
            .into_iter()
            .min_by_key(|&variable| store.size(variable))?;
        let values = store.values(variable);
        let value = values[self.rng.gen_range(0..values.len())];
        Some(Decision { variable, value })
    }
}

#[cfg(test)]
mod tests {
    use super::FirstFail;
    use super::FirstFailRandomValue;
    use crate::branching::Brancher;
    use crate::engine::Domain;
    use crate::engine::Model;

    #[test]
    fn picks_the_smallest_domain_and_its_minimum() {
        let mut model = Model::new();
        let _ = model.new_variable("x", Domain::interval(0, 9));
        let y = model.new_variable("y", Domain::sparse([3, 7]));
        let _ = model.new_variable("z", Domain::interval(0, 4));

        let decision = FirstFail.next_decision(&model).unwrap();
        assert_eq!(decision.variable, y);
        assert_eq!(decision.value, 3);
    }

    #[test]
    fn exhausted_model_yields_no_decision() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 3));
        model.post_assign(x, 2);

        assert!(FirstFail.next_decision(&model).is_none());
    }

    #[test]
    fn random_value_stays_in_the_domain() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::sparse([2, 5, 11]));

        let mut brancher = FirstFailRandomValue::new(42);
        for _ in 0..20 {
            let decision = brancher.next_decision(&model).unwrap();
            assert_eq!(decision.variable, x);
            assert!(model.store().contains(x, decision.value));
        }
    }
}
