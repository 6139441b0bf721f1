use fnv::FnvHashMap;

use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// Tasks with fixed durations may not overlap in time. Filtering is
/// pairwise: when one ordering of two tasks is impossible, the other is
/// enforced on the start bounds. Zero-duration tasks are filtered out by
/// the compiler before posting.
pub struct Disjunctive {
    starts: Vec<VariableId>,
    durations: Vec<i32>,
}

impl Disjunctive {
    pub fn new(starts: Vec<VariableId>, durations: Vec<i32>) -> Disjunctive {
        Disjunctive { starts, durations }
    }
}

impl Propagator for Disjunctive {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let tasks = self.starts.len();
        for first in 0..tasks {
            for second in 0..tasks {
                if first == second {
                    continue;
                }
                // Can `second` finish before `first` starts?
                let second_before_first = i64::from(store.min(self.starts[second]))
                    + i64::from(self.durations[second])
                    <= i64::from(store.max(self.starts[first]));
                if !second_before_first {
                    // Then `first` runs before `second`.
                    let earliest_end =
                        i64::from(store.min(self.starts[first])) + i64::from(self.durations[first]);
                    store.remove_below(
                        self.starts[second],
                        earliest_end.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
                    )?;
                    let latest_start = i64::from(store.max(self.starts[second]))
                        - i64::from(self.durations[first]);
                    store.remove_above(
                        self.starts[first],
                        latest_start.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        self.starts.clone()
    }
}

/// Tasks with fixed durations and demands share a resource of fixed
/// capacity. Timetable filtering: the compulsory parts of the tasks build a
/// resource profile, overloads fail, and candidate start times that would
/// overload the profile are pruned.
pub struct Cumulative {
    starts: Vec<VariableId>,
    durations: Vec<i32>,
    demands: Vec<i32>,
    capacity: i32,
}

impl Cumulative {
    pub fn new(
        starts: Vec<VariableId>,
        durations: Vec<i32>,
        demands: Vec<i32>,
        capacity: i32,
    ) -> Cumulative {
        Cumulative {
            starts,
            durations,
            demands,
            capacity,
        }
    }

    /// The mandatory usage of each task: the interval between its latest
    /// start and earliest end, when non-empty.
    fn compulsory_part(&self, store: &DomainStore, task: usize) -> Option<(i32, i32)> {
        let latest_start = store.max(self.starts[task]);
        let earliest_end = store.min(self.starts[task]) + self.durations[task];
        (latest_start < earliest_end).then_some((latest_start, earliest_end))
    }

    fn profile(&self, store: &DomainStore) -> FnvHashMap<i32, i32> {
        let mut profile = FnvHashMap::default();
        for task in 0..self.starts.len() {
            if let Some((from, to)) = self.compulsory_part(store, task) {
                for time in from..to {
                    *profile.entry(time).or_insert(0) += self.demands[task];
                }
            }
        }
        profile
    }
}

impl Propagator for Cumulative {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let profile = self.profile(store);
        if profile.values().any(|&height| height > self.capacity) {
            return Err(Inconsistency);
        }

        for task in 0..self.starts.len() {
            let duration = self.durations[task];
            let demand = self.demands[task];
            if duration == 0 || demand == 0 {
                continue;
            }
            let own_part = self.compulsory_part(store, task);
            let feasible: Vec<i32> = store
                .domain(self.starts[task])
                .iter()
                .filter(|&start| {
                    (start..start + duration).all(|time| {
                        let mut height = profile.get(&time).copied().unwrap_or(0);
                        // The task's own compulsory contribution is already
                        // in the profile.
                        if own_part.is_some_and(|(from, to)| (from..to).contains(&time)) {
                            height -= demand;
                        }
                        height + demand <= self.capacity
                    })
                })
                .collect();
            store.retain(self.starts[task], |start| {
                feasible.binary_search(&start).is_ok()
            })?;
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        self.starts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::Cumulative;
    use super::Disjunctive;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn disjunctive_orders_incompatible_tasks() {
        let mut store = DomainStore::default();
        let first = store.new_domain(Domain::interval(0, 1));
        let second = store.new_domain(Domain::interval(0, 10));

        // `second` (duration 5) cannot finish before `first` can start, so
        // `first` runs first and `second` starts no earlier than 0 + 3.
        let mut schedule = Disjunctive::new(vec![first, second], vec![3, 5]);
        schedule.propagate(&mut store).unwrap();
        assert_eq!(store.min(second), 3);
    }

    #[test]
    fn disjunctive_detects_overload() {
        let mut store = DomainStore::default();
        let first = store.new_domain(Domain::sparse([0]));
        let second = store.new_domain(Domain::sparse([1]));

        let mut schedule = Disjunctive::new(vec![first, second], vec![5, 5]);
        assert!(schedule.propagate(&mut store).is_err());
    }

    #[test]
    fn cumulative_rejects_profile_overload() {
        let mut store = DomainStore::default();
        let first = store.new_domain(Domain::sparse([0]));
        let second = store.new_domain(Domain::sparse([1]));

        let mut resource = Cumulative::new(vec![first, second], vec![3, 3], vec![2, 2], 3);
        assert!(resource.propagate(&mut store).is_err());
    }

    #[test]
    fn cumulative_prunes_overloading_starts() {
        let mut store = DomainStore::default();
        let fixed = store.new_domain(Domain::sparse([2]));
        let flexible = store.new_domain(Domain::interval(0, 6));

        // The fixed task occupies [2, 5) at demand 2; the flexible task
        // (duration 2, demand 2) must avoid that window entirely.
        let mut resource = Cumulative::new(vec![fixed, flexible], vec![3, 2], vec![2, 2], 3);
        resource.propagate(&mut store).unwrap();
        assert_eq!(store.values(flexible), vec![0, 5, 6]);
    }
}
