use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// Lexicographic ordering between two equal-length lists, strict or not.
/// Bounds filtering at the first position not yet fixed to equal values.
pub struct LexLessOrEqual {
    xs: Vec<VariableId>,
    ys: Vec<VariableId>,
    strict: bool,
}

impl LexLessOrEqual {
    pub fn new(xs: Vec<VariableId>, ys: Vec<VariableId>, strict: bool) -> LexLessOrEqual {
        LexLessOrEqual { xs, ys, strict }
    }
}

impl Propagator for LexLessOrEqual {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        for position in 0..self.xs.len() {
            let x = self.xs[position];
            let y = self.ys[position];
            if store.is_fixed(x) && store.is_fixed(y) {
                let x_value = store.min(x);
                let y_value = store.min(y);
                if x_value < y_value {
                    return Ok(());
                }
                if x_value > y_value {
                    return Err(Inconsistency);
                }
                continue;
            }
            // First open position: the prefix so far is fixed and equal.
            store.remove_above(x, store.max(y))?;
            store.remove_below(y, store.min(x))?;
            return Ok(());
        }
        if self.strict {
            Err(Inconsistency)
        } else {
            Ok(())
        }
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.xs.clone();
        variables.extend_from_slice(&self.ys);
        variables
    }
}

#[cfg(test)]
mod tests {
    use super::LexLessOrEqual;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn open_position_bounds_both_sides() {
        let mut store = DomainStore::default();
        let x0 = store.new_domain(Domain::sparse([4]));
        let y0 = store.new_domain(Domain::sparse([4]));
        let x1 = store.new_domain(Domain::interval(0, 9));
        let y1 = store.new_domain(Domain::interval(0, 5));

        let mut ordering = LexLessOrEqual::new(vec![x0, x1], vec![y0, y1], false);
        ordering.propagate(&mut store).unwrap();
        assert_eq!(store.max(x1), 5);
    }

    #[test]
    fn decided_prefix_settles_the_constraint() {
        let mut store = DomainStore::default();
        let x0 = store.new_domain(Domain::sparse([2]));
        let y0 = store.new_domain(Domain::sparse([5]));
        let x1 = store.new_domain(Domain::interval(0, 9));
        let y1 = store.new_domain(Domain::interval(0, 9));

        let mut ordering = LexLessOrEqual::new(vec![x0, x1], vec![y0, y1], true);
        ordering.propagate(&mut store).unwrap();
        // x0 < y0 already decides the ordering; no filtering downstream.
        assert_eq!(store.size(x1), 10);
    }

    #[test]
    fn equal_lists_violate_the_strict_order() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([3]));
        let y = store.new_domain(Domain::sparse([3]));

        let mut ordering = LexLessOrEqual::new(vec![x], vec![y], true);
        assert!(ordering.propagate(&mut store).is_err());

        let mut ordering = LexLessOrEqual::new(vec![x], vec![y], false);
        ordering.propagate(&mut store).unwrap();
    }

    #[test]
    fn reversed_prefix_fails() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([7]));
        let y = store.new_domain(Domain::sparse([1]));

        let mut ordering = LexLessOrEqual::new(vec![x], vec![y], false);
        assert!(ordering.propagate(&mut store).is_err());
    }
}
