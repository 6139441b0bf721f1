use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;
use crate::propagators::ceil_div;
use crate::propagators::clamp_to_i32;
use crate::propagators::floor_div;

/// The relations a [`Linear`] constraint supports directly. Strict and
/// flipped comparisons are normalised away before posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearOp {
    Equal,
    LessOrEqual,
    NotEqual,
}

/// Bounds filtering for `sum(coefficient * variable) op rhs`. Terms with a
/// zero coefficient are dropped at construction. All intermediate sums are
/// carried in 64 bits so that pathological coefficients do not wrap.
pub struct Linear {
    terms: Vec<(i32, VariableId)>,
    rhs: i32,
    op: LinearOp,
}

impl Linear {
    pub fn new(terms: Vec<(i32, VariableId)>, rhs: i32, op: LinearOp) -> Linear {
        let terms = terms
            .into_iter()
            .filter(|&(coefficient, _)| coefficient != 0)
            .collect();
        Linear { terms, rhs, op }
    }

    fn term_min(&self, store: &DomainStore, index: usize) -> i64 {
        let (coefficient, variable) = self.terms[index];
        let coefficient = i64::from(coefficient);
        if coefficient > 0 {
            coefficient * i64::from(store.min(variable))
        } else {
            coefficient * i64::from(store.max(variable))
        }
    }

    fn term_max(&self, store: &DomainStore, index: usize) -> i64 {
        let (coefficient, variable) = self.terms[index];
        let coefficient = i64::from(coefficient);
        if coefficient > 0 {
            coefficient * i64::from(store.max(variable))
        } else {
            coefficient * i64::from(store.min(variable))
        }
    }

    /// One pass of `sum <= rhs` filtering.
    fn filter_less_or_equal(&self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let sum_min: i64 = (0..self.terms.len())
            .map(|index| self.term_min(store, index))
            .sum();
        if sum_min > i64::from(self.rhs) {
            return Err(Inconsistency);
        }
        for index in 0..self.terms.len() {
            let (coefficient, variable) = self.terms[index];
            let slack = i64::from(self.rhs) - (sum_min - self.term_min(store, index));
            if coefficient > 0 {
                let bound = floor_div(slack, i64::from(coefficient));
                store.remove_above(variable, clamp_to_i32(bound))?;
            } else {
                let bound = ceil_div(slack, i64::from(coefficient));
                store.remove_below(variable, clamp_to_i32(bound))?;
            }
        }
        Ok(())
    }

    /// One pass of `sum >= rhs` filtering.
    fn filter_greater_or_equal(&self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let sum_max: i64 = (0..self.terms.len())
            .map(|index| self.term_max(store, index))
            .sum();
        if sum_max < i64::from(self.rhs) {
            return Err(Inconsistency);
        }
        for index in 0..self.terms.len() {
            let (coefficient, variable) = self.terms[index];
            let slack = i64::from(self.rhs) - (sum_max - self.term_max(store, index));
            if coefficient > 0 {
                let bound = ceil_div(slack, i64::from(coefficient));
                store.remove_below(variable, clamp_to_i32(bound))?;
            } else {
                let bound = floor_div(slack, i64::from(coefficient));
                store.remove_above(variable, clamp_to_i32(bound))?;
            }
        }
        Ok(())
    }

    fn filter_not_equal(&self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let mut unfixed = None;
        let mut fixed_sum: i64 = 0;
        for &(coefficient, variable) in &self.terms {
            if store.is_fixed(variable) {
                fixed_sum += i64::from(coefficient) * i64::from(store.min(variable));
            } else if unfixed.is_none() {
                unfixed = Some((coefficient, variable));
            } else {
                return Ok(());
            }
        }
        match unfixed {
            None => {
                if fixed_sum == i64::from(self.rhs) {
                    Err(Inconsistency)
                } else {
                    Ok(())
                }
            }
            Some((coefficient, variable)) => {
                let remainder = i64::from(self.rhs) - fixed_sum;
                if remainder % i64::from(coefficient) == 0 {
                    let forbidden = remainder / i64::from(coefficient);
                    if let Ok(forbidden) = i32::try_from(forbidden) {
                        store.remove(variable, forbidden)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl Propagator for Linear {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        match self.op {
            LinearOp::LessOrEqual => self.filter_less_or_equal(store),
            LinearOp::Equal => {
                self.filter_less_or_equal(store)?;
                self.filter_greater_or_equal(store)
            }
            LinearOp::NotEqual => self.filter_not_equal(store),
        }
    }

    fn variables(&self) -> Vec<VariableId> {
        self.terms.iter().map(|&(_, variable)| variable).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Linear;
    use super::LinearOp;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn equality_tightens_both_bounds() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 10));
        let y = store.new_domain(Domain::interval(0, 10));

        // x + y == 5
        let mut sum = Linear::new(vec![(1, x), (1, y)], 5, LinearOp::Equal);
        sum.propagate(&mut store).unwrap();
        assert_eq!(store.max(x), 5);
        assert_eq!(store.max(y), 5);

        store.remove_below(x, 3).unwrap();
        sum.propagate(&mut store).unwrap();
        assert_eq!(store.max(y), 2);
    }

    #[test]
    fn negative_coefficients_filter_correctly() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 10));
        let y = store.new_domain(Domain::interval(0, 10));

        // 2x - 3y <= -9 forces y >= 3 when x >= 0.
        let mut sum = Linear::new(vec![(2, x), (-3, y)], -9, LinearOp::LessOrEqual);
        sum.propagate(&mut store).unwrap();
        assert_eq!(store.min(y), 3);
    }

    #[test]
    fn not_equal_waits_for_one_unfixed() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 5));
        let y = store.new_domain(Domain::interval(0, 5));

        let mut sum = Linear::new(vec![(1, x), (1, y)], 4, LinearOp::NotEqual);
        sum.propagate(&mut store).unwrap();
        assert_eq!(store.size(x), 6);

        store.assign(y, 1).unwrap();
        sum.propagate(&mut store).unwrap();
        assert!(!store.contains(x, 3));
        assert_eq!(store.size(x), 5);
    }

    #[test]
    fn infeasible_sum_fails() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 2));
        let y = store.new_domain(Domain::interval(0, 2));

        let mut sum = Linear::new(vec![(1, x), (1, y)], 5, LinearOp::Equal);
        assert!(sum.propagate(&mut store).is_err());
    }
}
