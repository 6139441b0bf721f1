use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// The variables spell a word accepted by a deterministic finite automaton.
///
/// The transition function is dense over the alphabet `min_value..=max_value`
/// of the constrained variables; values outside the alphabet and missing
/// transitions both lead nowhere. Filtering computes forward and backward
/// reachable state layers and keeps only values carrying an edge between
/// them.
pub struct Regular {
    variables: Vec<VariableId>,
    delta: Vec<Vec<Option<usize>>>,
    start: usize,
    finals: Vec<bool>,
    min_value: i32,
}

impl Regular {
    /// `transitions` are `(from, value, to)` triples; triples whose value
    /// falls outside `min_value..=max_value` are dropped.
    pub fn new(
        variables: Vec<VariableId>,
        num_states: usize,
        transitions: &[(usize, i32, usize)],
        start: usize,
        finals: &[usize],
        min_value: i32,
        max_value: i32,
    ) -> Regular {
        let width = (max_value - min_value + 1).max(0) as usize;
        let mut delta = vec![vec![None; width]; num_states];
        for &(from, value, to) in transitions {
            if from < num_states && to < num_states && (min_value..=max_value).contains(&value) {
                delta[from][(value - min_value) as usize] = Some(to);
            }
        }
        let mut final_flags = vec![false; num_states];
        for &state in finals {
            if state < num_states {
                final_flags[state] = true;
            }
        }
        Regular {
            variables,
            delta,
            start,
            finals: final_flags,
            min_value,
        }
    }

    fn symbol(&self, value: i32) -> Option<usize> {
        let offset = value - self.min_value;
        if offset < 0 || offset as usize >= self.delta.first().map_or(0, Vec::len) {
            None
        } else {
            Some(offset as usize)
        }
    }
}

impl Propagator for Regular {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let num_states = self.delta.len();
        let positions = self.variables.len();

        // forward[i] holds the states reachable after consuming i values.
        let mut forward = vec![vec![false; num_states]; positions + 1];
        forward[0][self.start] = true;
        for position in 0..positions {
            for state in 0..num_states {
                if !forward[position][state] {
                    continue;
                }
                for value in store.domain(self.variables[position]).iter() {
                    if let Some(symbol) = self.symbol(value) {
                        if let Some(next) = self.delta[state][symbol] {
                            forward[position + 1][next] = true;
                        }
                    }
                }
            }
        }

        let mut backward = vec![vec![false; num_states]; positions + 1];
        for state in 0..num_states {
            backward[positions][state] = self.finals[state] && forward[positions][state];
        }
        if !backward[positions].iter().any(|&reachable| reachable) {
            return Err(Inconsistency);
        }
        for position in (0..positions).rev() {
            for state in 0..num_states {
                if !forward[position][state] {
                    continue;
                }
                for value in store.domain(self.variables[position]).iter() {
                    if let Some(symbol) = self.symbol(value) {
                        if let Some(next) = self.delta[state][symbol] {
                            if backward[position + 1][next] {
                                backward[position][state] = true;
                            }
                        }
                    }
                }
            }
        }

        for position in 0..positions {
            let mut supported = Vec::new();
            for value in store.domain(self.variables[position]).iter() {
                let Some(symbol) = self.symbol(value) else {
                    continue;
                };
                let has_edge = (0..num_states).any(|state| {
                    forward[position][state]
                        && self.delta[state][symbol]
                            .is_some_and(|next| backward[position + 1][next])
                });
                if has_edge {
                    supported.push(value);
                }
            }
            store.retain(self.variables[position], |value| {
                supported.binary_search(&value).is_ok()
            })?;
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        self.variables.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::Regular;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    // Words over {0, 1} with no two adjacent ones: state 0 after a zero,
    // state 1 after a one.
    fn no_adjacent_ones(
        store: &mut DomainStore,
        length: usize,
    ) -> (Vec<crate::engine::VariableId>, Regular) {
        let variables: Vec<_> = (0..length)
            .map(|_| store.new_domain(Domain::interval(0, 1)))
            .collect();
        let transitions = [(0, 0, 0), (0, 1, 1), (1, 0, 0)];
        let automaton = Regular::new(variables.clone(), 2, &transitions, 0, &[0, 1], 0, 1);
        (variables, automaton)
    }

    #[test]
    fn forced_ones_propagate_to_neighbours() {
        let mut store = DomainStore::default();
        let (variables, mut automaton) = no_adjacent_ones(&mut store, 3);

        store.assign(variables[1], 1).unwrap();
        automaton.propagate(&mut store).unwrap();
        assert_eq!(store.values(variables[0]), vec![0]);
        assert_eq!(store.values(variables[2]), vec![0]);
    }

    #[test]
    fn unsatisfiable_word_fails() {
        let mut store = DomainStore::default();
        let (variables, mut automaton) = no_adjacent_ones(&mut store, 2);

        store.assign(variables[0], 1).unwrap();
        store.assign(variables[1], 1).unwrap();
        assert!(automaton.propagate(&mut store).is_err());
    }

    #[test]
    fn out_of_alphabet_values_are_pruned() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 5));
        let transitions = [(0, 0, 1), (0, 1, 1)];
        let mut automaton = Regular::new(vec![x], 2, &transitions, 0, &[1], 0, 1);

        automaton.propagate(&mut store).unwrap();
        assert_eq!(store.values(x), vec![0, 1]);
    }
}
