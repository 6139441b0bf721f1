use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// The successor variables form a single Hamiltonian circuit over the nodes
/// `0..n`. Distinctness is posted separately by the compiler; this
/// propagator contributes range and self-loop pruning plus subtour
/// elimination along chains of fixed successors.
pub struct Circuit {
    successors: Vec<VariableId>,
}

impl Circuit {
    pub fn new(successors: Vec<VariableId>) -> Circuit {
        Circuit { successors }
    }
}

impl Propagator for Circuit {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let n = self.successors.len();
        for (node, &successor) in self.successors.iter().enumerate() {
            let node = node as i32;
            store.retain(successor, |value| {
                (0..n as i32).contains(&value) && (value != node || n == 1)
            })?;
        }

        // Walk each maximal chain of fixed successors; a chain that closes
        // before covering every node is a subtour.
        for start in 0..n {
            if !store.is_fixed(self.successors[start]) {
                continue;
            }
            let mut visited = vec![false; n];
            visited[start] = true;
            let mut length = 1;
            let mut current = store.min(self.successors[start]) as usize;
            while current != start && store.is_fixed(self.successors[current]) {
                if visited[current] {
                    return Err(Inconsistency);
                }
                visited[current] = true;
                length += 1;
                current = store.min(self.successors[current]) as usize;
            }
            if current == start {
                if length < n {
                    return Err(Inconsistency);
                }
            } else if length + 1 < n {
                // The chain ends at an undecided node: closing it back to
                // the chain start would leave the rest of the graph out.
                store.remove(self.successors[current], start as i32)?;
            }
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        self.successors.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::Circuit;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn self_loops_are_removed() {
        let mut store = DomainStore::default();
        let successors: Vec<_> = (0..3)
            .map(|_| store.new_domain(Domain::interval(0, 2)))
            .collect();

        let mut circuit = Circuit::new(successors.clone());
        circuit.propagate(&mut store).unwrap();
        assert_eq!(store.values(successors[0]), vec![1, 2]);
        assert_eq!(store.values(successors[1]), vec![0, 2]);
    }

    #[test]
    fn chains_cannot_close_early() {
        let mut store = DomainStore::default();
        let successors: Vec<_> = (0..4)
            .map(|_| store.new_domain(Domain::interval(0, 3)))
            .collect();

        let mut circuit = Circuit::new(successors.clone());
        store.assign(successors[0], 1).unwrap();
        circuit.propagate(&mut store).unwrap();
        // Node 1 may not point back to 0 while 2 and 3 are uncovered.
        assert_eq!(store.values(successors[1]), vec![2, 3]);
    }

    #[test]
    fn premature_cycle_fails() {
        let mut store = DomainStore::default();
        let successors: Vec<_> = (0..3)
            .map(|_| store.new_domain(Domain::interval(0, 2)))
            .collect();

        let mut circuit = Circuit::new(successors.clone());
        store.assign(successors[0], 1).unwrap();
        store.assign(successors[1], 0).unwrap();
        assert!(circuit.propagate(&mut store).is_err());
    }

    #[test]
    fn full_cycle_is_accepted() {
        let mut store = DomainStore::default();
        let successors: Vec<_> = (0..3)
            .map(|_| store.new_domain(Domain::interval(0, 2)))
            .collect();

        let mut circuit = Circuit::new(successors.clone());
        store.assign(successors[0], 1).unwrap();
        store.assign(successors[1], 2).unwrap();
        store.assign(successors[2], 0).unwrap();
        circuit.propagate(&mut store).unwrap();
    }
}
