use fnv::FnvHashMap;

use crate::engine::Model;
use crate::engine::VariableId;

/// Configuration of the marginal estimator: iteration cap and damping
/// factor for the popularity refinement loop.
#[derive(Debug, Clone, Copy)]
pub struct BeliefOptions {
    pub max_iterations: usize,
    pub damping: f64,
}

impl Default for BeliefOptions {
    fn default() -> BeliefOptions {
        BeliefOptions {
            max_iterations: 5,
            damping: 0.5,
        }
    }
}

/// Per-variable value distributions estimated from the live domains.
///
/// These are pseudo-marginals, not true solution-counting marginals: the
/// initial distribution is uniform over each domain, and each iteration
/// pulls a variable's distribution towards the popularity of its values
/// across all other live domains, damped by `damping`. Peaked distributions
/// then indicate values shared by many domains.
pub struct PseudoMarginals {
    distributions: FnvHashMap<VariableId, Vec<(i32, f64)>>,
}

impl PseudoMarginals {
    pub fn estimate(
        model: &Model,
        variables: &[VariableId],
        options: &BeliefOptions,
    ) -> PseudoMarginals {
        let store = model.store();
        let mut distributions: FnvHashMap<VariableId, Vec<(i32, f64)>> = FnvHashMap::default();
        for &variable in variables {
            let values = store.values(variable);
            let uniform = 1.0 / values.len() as f64;
            let _ = distributions.insert(
                variable,
                values.into_iter().map(|value| (value, uniform)).collect(),
            );
        }
        for _ in 0..options.max_iterations {
            let mut popularity: FnvHashMap<i32, f64> = FnvHashMap::default();
            for distribution in distributions.values() {
                for &(value, probability) in distribution {
                    *popularity.entry(value).or_insert(0.0) += probability;
                }
            }
            for distribution in distributions.values_mut() {
                let total: f64 = distribution
                    .iter()
                    .map(|&(value, _)| popularity[&value])
                    .sum();
                if total <= 0.0 {
                    continue;
                }
                for entry in distribution.iter_mut() {
                    let pulled = popularity[&entry.0] / total;
                    entry.1 = options.damping * entry.1 + (1.0 - options.damping) * pulled;
                }
            }
        }
        PseudoMarginals { distributions }
    }

    /// The `(value, probability)` pair with the highest probability.
    pub fn best_value(&self, variable: VariableId) -> Option<(i32, f64)> {
        self.distributions.get(&variable)?.iter().copied().max_by(
            |(_, first), (_, second)| first.total_cmp(second),
        )
    }

    /// The `(value, probability)` pair with the lowest probability.
    pub fn worst_value(&self, variable: VariableId) -> Option<(i32, f64)> {
        self.distributions.get(&variable)?.iter().copied().min_by(
            |(_, first), (_, second)| first.total_cmp(second),
        )
    }

    /// How peaked a distribution is relative to uniform: the maximum
    /// probability multiplied by the domain size. Uniform gives 1.
    pub fn strength(&self, variable: VariableId) -> Option<f64> {
        let distribution = self.distributions.get(&variable)?;
        let (_, best) = self.best_value(variable)?;
        Some(best * distribution.len() as f64)
    }

    /// Shannon entropy of the distribution, in nats.
    pub fn entropy(&self, variable: VariableId) -> Option<f64> {
        let distribution = self.distributions.get(&variable)?;
        let total: f64 = distribution.iter().map(|&(_, p)| p).sum();
        if total <= 0.0 {
            return Some(0.0);
        }
        let mut entropy = 0.0;
        for &(_, probability) in distribution {
            let probability = probability / total;
            if probability > 0.0 {
                entropy -= probability * probability.ln();
            }
        }
        Some(entropy)
    }
}

#[cfg(test)]
mod tests {
    use super::BeliefOptions;
    use super::PseudoMarginals;
    use crate::engine::Domain;
    use crate::engine::Model;

    #[test]
    fn shared_values_gain_probability() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::sparse([0, 1]));
        let _ = model.new_variable("y", Domain::sparse([1, 2]));
        let _ = model.new_variable("z", Domain::sparse([1, 3]));

        let variables = model.search_variables();
        let marginals =
            PseudoMarginals::estimate(&model, &variables, &BeliefOptions::default());
        let (value, probability) = marginals.best_value(x).unwrap();
        assert_eq!(value, 1);
        assert!(probability > 0.5);
    }

    #[test]
    fn uniform_distribution_has_strength_one() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 3));

        let variables = [x];
        let options = BeliefOptions {
            max_iterations: 0,
            damping: 0.5,
        };
        let marginals = PseudoMarginals::estimate(&model, &variables, &options);
        let strength = marginals.strength(x).unwrap();
        assert!((strength - 1.0).abs() < 1e-9);
        let entropy = marginals.entropy(x).unwrap();
        assert!((entropy - 4.0_f64.ln()).abs() < 1e-9);
    }
}
