use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// Channeling between two lists: `xs[i] = j` if and only if `ys[j] = i`.
/// With `xs` and `ys` the same list this is the self-inverse channel.
pub struct Inverse {
    xs: Vec<VariableId>,
    ys: Vec<VariableId>,
}

impl Inverse {
    pub fn new(xs: Vec<VariableId>, ys: Vec<VariableId>) -> Inverse {
        Inverse { xs, ys }
    }

    fn filter_side(
        store: &mut DomainStore,
        these: &[VariableId],
        those: &[VariableId],
    ) -> Result<(), Inconsistency> {
        let bound = those.len() as i32;
        for (position, &variable) in these.iter().enumerate() {
            let position = position as i32;
            let mirrors: Vec<bool> = those
                .iter()
                .map(|&mirror| store.contains(mirror, position))
                .collect();
            store.retain(variable, |value| {
                (0..bound).contains(&value) && mirrors[value as usize]
            })?;
            if store.is_fixed(variable) {
                let target = store.min(variable) as usize;
                store.assign(those[target], position)?;
            }
        }
        Ok(())
    }
}

impl Propagator for Inverse {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        Inverse::filter_side(store, &self.xs, &self.ys)?;
        Inverse::filter_side(store, &self.ys, &self.xs)
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.xs.clone();
        for &variable in &self.ys {
            if !variables.contains(&variable) {
                variables.push(variable);
            }
        }
        variables
    }
}

#[cfg(test)]
mod tests {
    use super::Inverse;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn fixed_values_channel_to_the_mirror() {
        let mut store = DomainStore::default();
        let xs: Vec<_> = (0..3)
            .map(|_| store.new_domain(Domain::interval(0, 2)))
            .collect();
        let ys: Vec<_> = (0..3)
            .map(|_| store.new_domain(Domain::interval(0, 2)))
            .collect();

        let mut channel = Inverse::new(xs.clone(), ys.clone());
        store.assign(xs[0], 2).unwrap();
        channel.propagate(&mut store).unwrap();
        assert_eq!(store.values(ys[2]), vec![0]);
    }

    #[test]
    fn values_without_mirror_support_are_dropped() {
        let mut store = DomainStore::default();
        let xs: Vec<_> = (0..2)
            .map(|_| store.new_domain(Domain::interval(0, 1)))
            .collect();
        let ys = vec![
            store.new_domain(Domain::sparse([1])),
            store.new_domain(Domain::interval(0, 1)),
        ];

        // ys[0] = 1 rules out xs[0] = 0 and forces the swap permutation.
        let mut channel = Inverse::new(xs.clone(), ys.clone());
        channel.propagate(&mut store).unwrap();
        assert_eq!(store.values(xs[0]), vec![1]);
        assert_eq!(store.values(xs[1]), vec![0]);
        assert_eq!(store.values(ys[1]), vec![0]);
    }

    #[test]
    fn conflicting_channel_fails() {
        let mut store = DomainStore::default();
        let xs = vec![
            store.new_domain(Domain::sparse([1])),
            store.new_domain(Domain::sparse([1])),
        ];
        let ys: Vec<_> = (0..2)
            .map(|_| store.new_domain(Domain::interval(0, 1)))
            .collect();

        let mut channel = Inverse::new(xs, ys);
        assert!(channel.propagate(&mut store).is_err());
    }
}
