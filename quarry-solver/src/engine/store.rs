use crate::engine::Domain;
use crate::engine::Inconsistency;

/// Identifies one variable within the model that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(u32);

impl VariableId {
    pub(crate) fn new(index: usize) -> VariableId {
        VariableId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The arena of all domains of one model. A generation counter is bumped on
/// every domain change; the fixpoint loop uses it to detect stability.
#[derive(Debug, Default)]
pub struct DomainStore {
    domains: Vec<Domain>,
    generation: u64,
}

impl DomainStore {
    pub fn new_domain(&mut self, domain: Domain) -> VariableId {
        let id = VariableId::new(self.domains.len());
        self.domains.push(domain);
        id
    }

    pub fn num_domains(&self) -> usize {
        self.domains.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn domain(&self, variable: VariableId) -> &Domain {
        &self.domains[variable.index()]
    }

    pub fn min(&self, variable: VariableId) -> i32 {
        self.domain(variable).min()
    }

    pub fn max(&self, variable: VariableId) -> i32 {
        self.domain(variable).max()
    }

    pub fn size(&self, variable: VariableId) -> usize {
        self.domain(variable).size()
    }

    pub fn is_fixed(&self, variable: VariableId) -> bool {
        self.domain(variable).is_fixed()
    }

    pub fn contains(&self, variable: VariableId, value: i32) -> bool {
        self.domain(variable).contains(value)
    }

    /// The values of the domain, snapshotted into a fresh vector.
    pub fn values(&self, variable: VariableId) -> Vec<i32> {
        self.domain(variable).iter().collect()
    }

    fn apply(
        &mut self,
        variable: VariableId,
        operation: impl FnOnce(&mut Domain) -> Result<bool, Inconsistency>,
    ) -> Result<(), Inconsistency> {
        let changed = operation(&mut self.domains[variable.index()])?;
        if changed {
            self.generation += 1;
        }
        Ok(())
    }

    pub fn remove(&mut self, variable: VariableId, value: i32) -> Result<(), Inconsistency> {
        self.apply(variable, |domain| domain.remove(value))
    }

    pub fn remove_below(&mut self, variable: VariableId, bound: i32) -> Result<(), Inconsistency> {
        self.apply(variable, |domain| domain.remove_below(bound))
    }

    pub fn remove_above(&mut self, variable: VariableId, bound: i32) -> Result<(), Inconsistency> {
        self.apply(variable, |domain| domain.remove_above(bound))
    }

    pub fn assign(&mut self, variable: VariableId, value: i32) -> Result<(), Inconsistency> {
        self.apply(variable, |domain| domain.assign(value))
    }

    pub fn retain(
        &mut self,
        variable: VariableId,
        keep: impl FnMut(i32) -> bool,
    ) -> Result<(), Inconsistency> {
        self.apply(variable, |domain| domain.retain(keep))
    }

    pub(crate) fn snapshot(&self) -> Vec<Domain> {
        self.domains.clone()
    }

    pub(crate) fn restore(&mut self, snapshot: Vec<Domain>) {
        self.domains = snapshot;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::DomainStore;
    use crate::engine::Domain;

    #[test]
    fn generation_tracks_changes() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 5));

        let before = store.generation();
        store.remove(x, 3).unwrap();
        assert!(store.generation() > before);

        let before = store.generation();
        store.remove(x, 3).unwrap();
        assert_eq!(store.generation(), before);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 5));

        let snapshot = store.snapshot();
        store.assign(x, 2).unwrap();
        assert!(store.is_fixed(x));

        store.restore(snapshot);
        assert_eq!(store.size(x), 6);
    }
}
