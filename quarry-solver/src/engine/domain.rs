use crate::engine::Inconsistency;

/// An explicit, sorted set of admissible values for one integer variable.
///
/// Every narrowing operation reports whether it changed the domain and fails
/// with [`Inconsistency`] when it would empty it; the domain is left empty in
/// that case, which is only observable until the enclosing state is restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    values: Vec<i32>,
}

impl Domain {
    /// A domain holding all values in `lower..=upper`; empty if the bounds
    /// cross.
    pub fn interval(lower: i32, upper: i32) -> Domain {
        Domain {
            values: (lower..=upper).collect(),
        }
    }

    /// A domain holding the given values; duplicates are dropped.
    pub fn sparse(values: impl IntoIterator<Item = i32>) -> Domain {
        let mut values: Vec<i32> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Domain { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_fixed(&self) -> bool {
        self.values.len() == 1
    }

    /// The smallest value. Panics on an empty domain, which cannot be
    /// observed through the store.
    pub fn min(&self) -> i32 {
        self.values[0]
    }

    pub fn max(&self) -> i32 {
        self.values[self.values.len() - 1]
    }

    pub fn contains(&self, value: i32) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.iter().copied()
    }

    fn check(&self, changed: bool) -> Result<bool, Inconsistency> {
        if self.values.is_empty() {
            Err(Inconsistency)
        } else {
            Ok(changed)
        }
    }

    pub fn remove(&mut self, value: i32) -> Result<bool, Inconsistency> {
        let changed = match self.values.binary_search(&value) {
            Ok(position) => {
                let _ = self.values.remove(position);
                true
            }
            Err(_) => false,
        };
        self.check(changed)
    }

    pub fn remove_below(&mut self, bound: i32) -> Result<bool, Inconsistency> {
        let cut = self.values.partition_point(|&value| value < bound);
        if cut > 0 {
            self.values.drain(..cut);
        }
        self.check(cut > 0)
    }

    pub fn remove_above(&mut self, bound: i32) -> Result<bool, Inconsistency> {
        let cut = self.values.partition_point(|&value| value <= bound);
        let changed = cut < self.values.len();
        self.values.truncate(cut);
        self.check(changed)
    }

    pub fn assign(&mut self, value: i32) -> Result<bool, Inconsistency> {
        if !self.contains(value) {
            self.values.clear();
            return Err(Inconsistency);
        }
        let changed = self.values.len() > 1;
        self.values.clear();
        self.values.push(value);
        Ok(changed)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(i32) -> bool) -> Result<bool, Inconsistency> {
        let before = self.values.len();
        self.values.retain(|&value| keep(value));
        self.check(self.values.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::Domain;

    #[test]
    fn interval_bounds() {
        let domain = Domain::interval(-2, 3);
        assert_eq!(domain.min(), -2);
        assert_eq!(domain.max(), 3);
        assert_eq!(domain.size(), 6);
        assert!(!domain.is_fixed());
    }

    #[test]
    fn sparse_sorts_and_dedups() {
        let domain = Domain::sparse([5, 1, 3, 1]);
        assert_eq!(domain.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn removal_keeps_order() {
        let mut domain = Domain::interval(0, 4);
        assert!(domain.remove(2).unwrap());
        assert!(!domain.remove(2).unwrap());
        assert!(domain.remove_below(1).unwrap());
        assert!(domain.remove_above(3).unwrap());
        assert_eq!(domain.iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn wipeout_is_reported() {
        let mut domain = Domain::interval(0, 1);
        assert!(domain.remove_below(5).is_err());

        let mut domain = Domain::interval(0, 1);
        assert!(domain.assign(7).is_err());
    }

    #[test]
    fn assign_narrows_to_single_value() {
        let mut domain = Domain::interval(0, 9);
        assert!(domain.assign(4).unwrap());
        assert!(domain.is_fixed());
        assert_eq!(domain.min(), 4);
    }
}
