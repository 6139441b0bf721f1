use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// `sum(coefficient * variable) mod modulus == rhs`, with the mathematical
/// (non-negative) remainder. Backs the decomposition of modulo by a
/// constant; filtering waits until at most one variable is unfixed.
pub struct SumMod {
    terms: Vec<(i32, VariableId)>,
    rhs: i32,
    modulus: i32,
}

impl SumMod {
    /// `modulus` must be positive; the compiler rejects zero and negates
    /// negative divisors before posting.
    pub fn new(terms: Vec<(i32, VariableId)>, rhs: i32, modulus: i32) -> SumMod {
        SumMod {
            terms,
            rhs: rhs.rem_euclid(modulus),
            modulus,
        }
    }
}

impl Propagator for SumMod {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
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
        let modulus = i64::from(self.modulus);
        match unfixed {
            None => {
                if fixed_sum.rem_euclid(modulus) == i64::from(self.rhs) {
                    Ok(())
                } else {
                    Err(Inconsistency)
                }
            }
            Some((coefficient, variable)) => store.retain(variable, |value| {
                let total = fixed_sum + i64::from(coefficient) * i64::from(value);
                total.rem_euclid(modulus) == i64::from(self.rhs)
            }),
        }
    }

    fn variables(&self) -> Vec<VariableId> {
        self.terms.iter().map(|&(_, variable)| variable).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::SumMod;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn filters_last_unfixed_variable() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 9));
        let y = store.new_domain(Domain::interval(0, 9));

        // (x + y) mod 3 == 1
        let mut constraint = SumMod::new(vec![(1, x), (1, y)], 1, 3);
        constraint.propagate(&mut store).unwrap();
        assert_eq!(store.size(x), 10);

        store.assign(x, 2).unwrap();
        constraint.propagate(&mut store).unwrap();
        assert_eq!(store.values(y), vec![2, 5, 8]);
    }

    #[test]
    fn negative_totals_use_mathematical_remainder() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([-4]));
        let y = store.new_domain(Domain::interval(0, 2));

        // (x + y) mod 3 == 2 with x = -4 forces y = 0.
        let mut constraint = SumMod::new(vec![(1, x), (1, y)], 2, 3);
        constraint.propagate(&mut store).unwrap();
        assert_eq!(store.values(y), vec![0]);
    }

    #[test]
    fn fully_fixed_violation_fails() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([4]));

        let mut constraint = SumMod::new(vec![(1, x)], 0, 3);
        assert!(constraint.propagate(&mut store).is_err());
    }
}
