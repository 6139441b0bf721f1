use fnv::FnvHashSet;

use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// A positive table: the variables must jointly take one of the listed
/// tuples. Filtering is generalised arc consistency by support scanning.
pub struct Table {
    variables: Vec<VariableId>,
    tuples: Vec<Vec<i32>>,
}

impl Table {
    /// Tuples whose arity does not match the variable count are ignored.
    pub fn new(variables: Vec<VariableId>, tuples: Vec<Vec<i32>>) -> Table {
        let arity = variables.len();
        let tuples = tuples
            .into_iter()
            .filter(|tuple| tuple.len() == arity)
            .collect();
        Table { variables, tuples }
    }
}

impl Propagator for Table {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let mut supported: Vec<FnvHashSet<i32>> =
            vec![FnvHashSet::default(); self.variables.len()];
        let mut any_valid = false;
        for tuple in &self.tuples {
            let valid = tuple
                .iter()
                .zip(&self.variables)
                .all(|(&value, &variable)| store.contains(variable, value));
            if valid {
                any_valid = true;
                for (position, &value) in tuple.iter().enumerate() {
                    let _ = supported[position].insert(value);
                }
            }
        }
        if !any_valid {
            return Err(Inconsistency);
        }
        for (position, &variable) in self.variables.iter().enumerate() {
            let values = &supported[position];
            store.retain(variable, |value| values.contains(&value))?;
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        self.variables.clone()
    }
}

/// A negative table: the variables must avoid every listed tuple. Filtering
/// waits until at most one variable is unfixed.
pub struct NegativeTable {
    variables: Vec<VariableId>,
    tuples: Vec<Vec<i32>>,
}

impl NegativeTable {
    pub fn new(variables: Vec<VariableId>, tuples: Vec<Vec<i32>>) -> NegativeTable {
        let arity = variables.len();
        let tuples = tuples
            .into_iter()
            .filter(|tuple| tuple.len() == arity)
            .collect();
        NegativeTable { variables, tuples }
    }
}

impl Propagator for NegativeTable {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let mut unfixed = None;
        for (position, &variable) in self.variables.iter().enumerate() {
            if !store.is_fixed(variable) {
                if unfixed.is_some() {
                    return Ok(());
                }
                unfixed = Some(position);
            }
        }
        for tuple in &self.tuples {
            let matches_fixed = tuple.iter().enumerate().all(|(position, &value)| {
                Some(position) == unfixed || store.min(self.variables[position]) == value
            });
            if !matches_fixed {
                continue;
            }
            match unfixed {
                None => return Err(Inconsistency),
                Some(position) => store.remove(self.variables[position], tuple[position])?,
            }
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        self.variables.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::NegativeTable;
    use super::Table;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn table_prunes_unsupported_values() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 3));
        let y = store.new_domain(Domain::interval(0, 3));

        let mut table = Table::new(
            vec![x, y],
            vec![vec![0, 1], vec![1, 2], vec![2, 5], vec![3, 3]],
        );
        table.propagate(&mut store).unwrap();
        // (2, 5) has no support for y.
        assert_eq!(store.values(x), vec![0, 1, 3]);
        assert_eq!(store.values(y), vec![1, 2, 3]);
    }

    #[test]
    fn table_without_valid_tuples_fails() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 1));

        let mut table = Table::new(vec![x], vec![vec![5], vec![9]]);
        assert!(table.propagate(&mut store).is_err());
    }

    #[test]
    fn negative_table_removes_the_completing_value() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([1]));
        let y = store.new_domain(Domain::interval(0, 3));

        let mut table = NegativeTable::new(vec![x, y], vec![vec![1, 2], vec![0, 3]]);
        table.propagate(&mut store).unwrap();
        assert_eq!(store.values(y), vec![0, 1, 3]);
    }

    #[test]
    fn negative_table_rejects_a_forbidden_assignment() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([1]));
        let y = store.new_domain(Domain::sparse([2]));

        let mut table = NegativeTable::new(vec![x, y], vec![vec![1, 2]]);
        assert!(table.propagate(&mut store).is_err());
    }
}
