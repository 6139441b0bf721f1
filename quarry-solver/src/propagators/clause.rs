use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// A disjunction of literals over 0/1 variables; the boolean polarity says
/// whether the literal asks for 1 or for 0. Unit propagation only.
pub struct Clause {
    literals: Vec<(VariableId, bool)>,
}

impl Clause {
    pub fn new(literals: Vec<(VariableId, bool)>) -> Clause {
        Clause { literals }
    }

    fn literal_value(store: &DomainStore, variable: VariableId, polarity: bool) -> Option<bool> {
        if !store.is_fixed(variable) {
            return None;
        }
        Some((store.min(variable) == 1) == polarity)
    }
}

impl Propagator for Clause {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let mut unresolved = None;
        let mut unresolved_count = 0;
        for &(variable, polarity) in &self.literals {
            match Clause::literal_value(store, variable, polarity) {
                Some(true) => return Ok(()),
                Some(false) => {}
                None => {
                    unresolved = Some((variable, polarity));
                    unresolved_count += 1;
                }
            }
        }
        match (unresolved, unresolved_count) {
            (None, _) => Err(Inconsistency),
            (Some((variable, polarity)), 1) => {
                store.assign(variable, if polarity { 1 } else { 0 })
            }
            _ => Ok(()),
        }
    }

    fn variables(&self) -> Vec<VariableId> {
        self.literals
            .iter()
            .map(|&(variable, _)| variable)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Clause;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn unit_clause_fixes_the_literal() {
        let mut store = DomainStore::default();
        let a = store.new_domain(Domain::sparse([0]));
        let b = store.new_domain(Domain::interval(0, 1));

        let mut clause = Clause::new(vec![(a, true), (b, false)]);
        clause.propagate(&mut store).unwrap();
        assert_eq!(store.values(b), vec![0]);
    }

    #[test]
    fn satisfied_clause_is_quiet() {
        let mut store = DomainStore::default();
        let a = store.new_domain(Domain::sparse([1]));
        let b = store.new_domain(Domain::interval(0, 1));

        let mut clause = Clause::new(vec![(a, true), (b, true)]);
        clause.propagate(&mut store).unwrap();
        assert_eq!(store.size(b), 2);
    }

    #[test]
    fn falsified_clause_fails() {
        let mut store = DomainStore::default();
        let a = store.new_domain(Domain::sparse([0]));
        let b = store.new_domain(Domain::sparse([1]));

        let mut clause = Clause::new(vec![(a, true), (b, false)]);
        assert!(clause.propagate(&mut store).is_err());
    }
}
