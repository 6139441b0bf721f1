use fnv::FnvHashSet;

use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// Pairwise distinctness. Filtering is forward checking (a fixed value is
/// removed everywhere else) plus a pigeonhole test on the union of the
/// domains.
pub struct AllDifferent {
    variables: Vec<VariableId>,
}

impl AllDifferent {
    pub fn new(variables: Vec<VariableId>) -> AllDifferent {
        AllDifferent { variables }
    }
}

impl Propagator for AllDifferent {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        for position in 0..self.variables.len() {
            let variable = self.variables[position];
            if !store.is_fixed(variable) {
                continue;
            }
            let value = store.min(variable);
            for (other_position, &other) in self.variables.iter().enumerate() {
                if other_position != position {
                    store.remove(other, value)?;
                }
            }
        }

        let mut union = FnvHashSet::default();
        for &variable in &self.variables {
            union.extend(store.domain(variable).iter());
        }
        if union.len() < self.variables.len() {
            return Err(Inconsistency);
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        self.variables.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::AllDifferent;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn fixed_values_are_removed_elsewhere() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([2]));
        let y = store.new_domain(Domain::interval(0, 3));
        let z = store.new_domain(Domain::interval(0, 3));

        let mut distinct = AllDifferent::new(vec![x, y, z]);
        distinct.propagate(&mut store).unwrap();
        assert_eq!(store.values(y), vec![0, 1, 3]);
        assert_eq!(store.values(z), vec![0, 1, 3]);
    }

    #[test]
    fn too_few_values_fail() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 1));
        let y = store.new_domain(Domain::interval(0, 1));
        let z = store.new_domain(Domain::interval(0, 1));

        let mut distinct = AllDifferent::new(vec![x, y, z]);
        assert!(distinct.propagate(&mut store).is_err());
    }

    #[test]
    fn duplicate_fixed_values_fail() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([1]));
        let y = store.new_domain(Domain::sparse([1]));

        let mut distinct = AllDifferent::new(vec![x, y]);
        assert!(distinct.propagate(&mut store).is_err());
    }
}
