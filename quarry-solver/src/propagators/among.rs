use fnv::FnvHashSet;

use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// Counts how many of the variables take a value from a fixed set and
/// channels that count into the `occurrences` variable. Backs `count`,
/// `among` and the cardinality decompositions.
pub struct Among {
    variables: Vec<VariableId>,
    values: FnvHashSet<i32>,
    occurrences: VariableId,
}

impl Among {
    pub fn new(
        variables: Vec<VariableId>,
        values: impl IntoIterator<Item = i32>,
        occurrences: VariableId,
    ) -> Among {
        Among {
            variables,
            values: values.into_iter().collect(),
            occurrences,
        }
    }

    fn surely_counted(&self, store: &DomainStore, variable: VariableId) -> bool {
        store
            .domain(variable)
            .iter()
            .all(|value| self.values.contains(&value))
    }

    fn possibly_counted(&self, store: &DomainStore, variable: VariableId) -> bool {
        store
            .domain(variable)
            .iter()
            .any(|value| self.values.contains(&value))
    }
}

impl Propagator for Among {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let lower = self
            .variables
            .iter()
            .filter(|&&variable| self.surely_counted(store, variable))
            .count() as i32;
        let upper = self
            .variables
            .iter()
            .filter(|&&variable| self.possibly_counted(store, variable))
            .count() as i32;

        store.remove_below(self.occurrences, lower)?;
        store.remove_above(self.occurrences, upper)?;

        if store.max(self.occurrences) == lower {
            // Every undecided variable must stay out of the value set.
            for &variable in &self.variables {
                if !self.surely_counted(store, variable) {
                    store.retain(variable, |value| !self.values.contains(&value))?;
                }
            }
        } else if store.min(self.occurrences) == upper {
            // Every variable that can still be counted must be.
            for &variable in &self.variables {
                if self.possibly_counted(store, variable) {
                    store.retain(variable, |value| self.values.contains(&value))?;
                }
            }
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.variables.clone();
        variables.push(self.occurrences);
        variables
    }
}

#[cfg(test)]
mod tests {
    use super::Among;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn occurrence_bounds_follow_the_domains() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([1]));
        let y = store.new_domain(Domain::interval(0, 3));
        let z = store.new_domain(Domain::sparse([5]));
        let occurrences = store.new_domain(Domain::interval(0, 3));

        let mut among = Among::new(vec![x, y, z], [1, 2], occurrences);
        among.propagate(&mut store).unwrap();
        assert_eq!(store.min(occurrences), 1);
        assert_eq!(store.max(occurrences), 2);
    }

    #[test]
    fn saturated_count_excludes_the_rest() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([1]));
        let y = store.new_domain(Domain::interval(0, 3));
        let occurrences = store.new_domain(Domain::sparse([1]));

        let mut among = Among::new(vec![x, y], [1, 2], occurrences);
        among.propagate(&mut store).unwrap();
        assert_eq!(store.values(y), vec![0, 3]);
    }

    #[test]
    fn starved_count_forces_membership() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 3));
        let y = store.new_domain(Domain::interval(0, 3));
        let occurrences = store.new_domain(Domain::sparse([2]));

        let mut among = Among::new(vec![x, y], [1, 2], occurrences);
        among.propagate(&mut store).unwrap();
        assert_eq!(store.values(x), vec![1, 2]);
        assert_eq!(store.values(y), vec![1, 2]);
    }
}
