use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// Items with fixed sizes are assigned to bins; each bin's load variable
/// equals the total size placed in it. Bins are numbered `0..loads.len()`.
pub struct BinPacking {
    bins: Vec<VariableId>,
    sizes: Vec<i32>,
    loads: Vec<VariableId>,
}

impl BinPacking {
    pub fn new(bins: Vec<VariableId>, sizes: Vec<i32>, loads: Vec<VariableId>) -> BinPacking {
        BinPacking { bins, sizes, loads }
    }
}

impl Propagator for BinPacking {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let num_bins = self.loads.len() as i32;
        for &bin in &self.bins {
            store.retain(bin, |value| (0..num_bins).contains(&value))?;
        }

        let total: i64 = self.sizes.iter().map(|&size| i64::from(size)).sum();
        for (bin_index, &load) in self.loads.iter().enumerate() {
            let bin_index = bin_index as i32;
            let mut committed: i64 = 0;
            let mut possible: i64 = 0;
            for (item, &bin) in self.bins.iter().enumerate() {
                if store.contains(bin, bin_index) {
                    possible += i64::from(self.sizes[item]);
                    if store.is_fixed(bin) {
                        committed += i64::from(self.sizes[item]);
                    }
                }
            }
            store.remove_below(load, committed.min(i64::from(i32::MAX)) as i32)?;
            store.remove_above(load, possible.min(i64::from(i32::MAX)) as i32)?;

            let load_max = i64::from(store.max(load));
            let load_min = i64::from(store.min(load));
            for (item, &bin) in self.bins.iter().enumerate() {
                if store.is_fixed(bin) || !store.contains(bin, bin_index) {
                    continue;
                }
                let size = i64::from(self.sizes[item]);
                if committed + size > load_max {
                    // The item no longer fits in this bin.
                    store.remove(bin, bin_index)?;
                } else if possible - size < load_min {
                    // Without this item the bin cannot reach its minimum
                    // load.
                    store.assign(bin, bin_index)?;
                }
            }
        }

        // The loads partition the total size.
        let loads_min: i64 = self
            .loads
            .iter()
            .map(|&load| i64::from(store.min(load)))
            .sum();
        let loads_max: i64 = self
            .loads
            .iter()
            .map(|&load| i64::from(store.max(load)))
            .sum();
        if loads_min > total || loads_max < total {
            return Err(Inconsistency);
        }
        for &load in &self.loads {
            let others_min = loads_min - i64::from(store.min(load));
            let others_max = loads_max - i64::from(store.max(load));
            store.remove_above(load, (total - others_min).min(i64::from(i32::MAX)) as i32)?;
            store.remove_below(load, (total - others_max).max(i64::from(i32::MIN)) as i32)?;
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.bins.clone();
        variables.extend_from_slice(&self.loads);
        variables
    }
}

#[cfg(test)]
mod tests {
    use super::BinPacking;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn loads_track_committed_and_possible_sizes() {
        let mut store = DomainStore::default();
        let bins = vec![
            store.new_domain(Domain::sparse([0])),
            store.new_domain(Domain::interval(0, 1)),
        ];
        let loads = vec![
            store.new_domain(Domain::interval(0, 10)),
            store.new_domain(Domain::interval(0, 10)),
        ];

        let mut packing = BinPacking::new(bins, vec![3, 4], loads.clone());
        packing.propagate(&mut store).unwrap();
        assert_eq!(store.min(loads[0]), 3);
        assert_eq!(store.max(loads[0]), 7);
        assert_eq!(store.max(loads[1]), 4);
    }

    #[test]
    fn oversized_items_leave_the_bin() {
        let mut store = DomainStore::default();
        let bins = vec![
            store.new_domain(Domain::sparse([0])),
            store.new_domain(Domain::interval(0, 1)),
        ];
        let loads = vec![
            store.new_domain(Domain::interval(0, 4)),
            store.new_domain(Domain::interval(0, 10)),
        ];

        // Item 0 (size 3) is committed to bin 0; item 1 (size 4) would
        // overflow it.
        let mut packing = BinPacking::new(bins.clone(), vec![3, 4], loads);
        packing.propagate(&mut store).unwrap();
        assert_eq!(store.values(bins[1]), vec![1]);
    }

    #[test]
    fn needed_items_are_committed() {
        let mut store = DomainStore::default();
        let bins = vec![store.new_domain(Domain::interval(0, 1))];
        let loads = vec![
            store.new_domain(Domain::interval(5, 10)),
            store.new_domain(Domain::interval(0, 10)),
        ];

        // Bin 0 must reach load 5 and only one item exists.
        let mut packing = BinPacking::new(bins.clone(), vec![5], loads);
        packing.propagate(&mut store).unwrap();
        assert_eq!(store.values(bins[0]), vec![0]);
    }

    #[test]
    fn loads_exceeding_the_total_fail() {
        let mut store = DomainStore::default();
        let bins = vec![store.new_domain(Domain::interval(0, 1))];
        let loads = vec![
            store.new_domain(Domain::interval(4, 10)),
            store.new_domain(Domain::interval(4, 10)),
        ];

        let mut packing = BinPacking::new(bins, vec![5], loads);
        assert!(packing.propagate(&mut store).is_err());
    }
}
