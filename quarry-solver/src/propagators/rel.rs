use crate::basic_types::RelOp;
use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// A comparison between two variables.
pub struct Binary {
    x: VariableId,
    y: VariableId,
    op: RelOp,
}

impl Binary {
    pub fn new(x: VariableId, y: VariableId, op: RelOp) -> Binary {
        Binary { x, y, op }
    }
}

impl Propagator for Binary {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        enforce_between(store, self.x, self.y, self.op)
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.x, self.y]
    }
}

fn enforce_between(
    store: &mut DomainStore,
    x: VariableId,
    y: VariableId,
    op: RelOp,
) -> Result<(), Inconsistency> {
    match op {
        RelOp::Equal => {
            let y_values = store.values(y);
            store.retain(x, |value| y_values.binary_search(&value).is_ok())?;
            let x_values = store.values(x);
            store.retain(y, |value| x_values.binary_search(&value).is_ok())
        }
        RelOp::NotEqual => {
            if store.is_fixed(y) {
                store.remove(x, store.min(y))?;
            }
            if store.is_fixed(x) {
                store.remove(y, store.min(x))?;
            }
            Ok(())
        }
        RelOp::LessOrEqual => {
            store.remove_above(x, store.max(y))?;
            store.remove_below(y, store.min(x))
        }
        RelOp::LessThan => {
            store.remove_above(x, store.max(y) - 1)?;
            store.remove_below(y, store.min(x) + 1)
        }
        RelOp::GreaterOrEqual => enforce_between(store, y, x, RelOp::LessOrEqual),
        RelOp::GreaterThan => enforce_between(store, y, x, RelOp::LessThan),
    }
}

/// The right-hand side of a reified comparison.
#[derive(Debug, Clone, Copy)]
pub enum Operand {
    Variable(VariableId),
    Constant(i32),
}

impl Operand {
    fn min(self, store: &DomainStore) -> i32 {
        match self {
            Operand::Variable(variable) => store.min(variable),
            Operand::Constant(value) => value,
        }
    }

    fn max(self, store: &DomainStore) -> i32 {
        match self {
            Operand::Variable(variable) => store.max(variable),
            Operand::Constant(value) => value,
        }
    }

    fn contains(self, store: &DomainStore, value: i32) -> bool {
        match self {
            Operand::Variable(variable) => store.contains(variable, value),
            Operand::Constant(constant) => constant == value,
        }
    }
}

/// `b <-> (x op rhs)` over a 0/1 control variable `b`. The control is fixed
/// as soon as the comparison is entailed or disentailed by the bounds, and a
/// fixed control enforces the comparison or its negation.
pub struct ReifiedBinary {
    b: VariableId,
    x: VariableId,
    rhs: Operand,
    op: RelOp,
}

impl ReifiedBinary {
    pub fn new(b: VariableId, x: VariableId, rhs: Operand, op: RelOp) -> ReifiedBinary {
        ReifiedBinary { b, x, rhs, op }
    }

    fn is_entailed(&self, store: &DomainStore) -> bool {
        let x = self.x;
        match self.op {
            RelOp::Equal => {
                store.is_fixed(x)
                    && self.rhs.min(store) == self.rhs.max(store)
                    && store.min(x) == self.rhs.min(store)
            }
            RelOp::NotEqual => store
                .domain(x)
                .iter()
                .all(|value| !self.rhs.contains(store, value)),
            RelOp::LessOrEqual => store.max(x) <= self.rhs.min(store),
            RelOp::LessThan => store.max(x) < self.rhs.min(store),
            RelOp::GreaterOrEqual => store.min(x) >= self.rhs.max(store),
            RelOp::GreaterThan => store.min(x) > self.rhs.max(store),
        }
    }

    fn can_hold(&self, store: &DomainStore) -> bool {
        let x = self.x;
        match self.op {
            RelOp::Equal => store
                .domain(x)
                .iter()
                .any(|value| self.rhs.contains(store, value)),
            RelOp::NotEqual => {
                !(store.is_fixed(x)
                    && self.rhs.min(store) == self.rhs.max(store)
                    && store.min(x) == self.rhs.min(store))
            }
            RelOp::LessOrEqual => store.min(x) <= self.rhs.max(store),
            RelOp::LessThan => store.min(x) < self.rhs.max(store),
            RelOp::GreaterOrEqual => store.max(x) >= self.rhs.min(store),
            RelOp::GreaterThan => store.max(x) > self.rhs.min(store),
        }
    }

    fn enforce(&self, store: &mut DomainStore, op: RelOp) -> Result<(), Inconsistency> {
        match self.rhs {
            Operand::Variable(y) => enforce_between(store, self.x, y, op),
            Operand::Constant(constant) => match op {
                RelOp::Equal => store.assign(self.x, constant),
                RelOp::NotEqual => store.remove(self.x, constant),
                RelOp::LessOrEqual => store.remove_above(self.x, constant),
                RelOp::LessThan => store.remove_above(self.x, constant - 1),
                RelOp::GreaterOrEqual => store.remove_below(self.x, constant),
                RelOp::GreaterThan => store.remove_below(self.x, constant + 1),
            },
        }
    }
}

impl Propagator for ReifiedBinary {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        if self.is_entailed(store) {
            store.assign(self.b, 1)?;
        } else if !self.can_hold(store) {
            store.assign(self.b, 0)?;
        }
        if store.is_fixed(self.b) {
            if store.min(self.b) == 1 {
                self.enforce(store, self.op)?;
            } else {
                self.enforce(store, self.op.negated())?;
            }
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        match self.rhs {
            Operand::Variable(y) => vec![self.b, self.x, y],
            Operand::Constant(_) => vec![self.b, self.x],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Binary;
    use super::Operand;
    use super::ReifiedBinary;
    use crate::basic_types::RelOp;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn equality_keeps_the_intersection() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::sparse([1, 3, 5, 7]));
        let y = store.new_domain(Domain::interval(4, 9));

        let mut rel = Binary::new(x, y, RelOp::Equal);
        rel.propagate(&mut store).unwrap();
        assert_eq!(store.values(x), vec![5, 7]);
        assert_eq!(store.values(y), vec![5, 7]);
    }

    #[test]
    fn strict_comparison_shaves_bounds() {
        let mut store = DomainStore::default();
        let x = store.new_domain(Domain::interval(0, 9));
        let y = store.new_domain(Domain::interval(0, 9));

        let mut rel = Binary::new(x, y, RelOp::GreaterThan);
        rel.propagate(&mut store).unwrap();
        assert_eq!(store.min(x), 1);
        assert_eq!(store.max(y), 8);
    }

    #[test]
    fn reification_detects_entailment() {
        let mut store = DomainStore::default();
        let b = store.new_domain(Domain::interval(0, 1));
        let x = store.new_domain(Domain::interval(0, 3));

        let mut rel = ReifiedBinary::new(b, x, Operand::Constant(5), RelOp::LessOrEqual);
        rel.propagate(&mut store).unwrap();
        assert_eq!(store.values(b), vec![1]);
    }

    #[test]
    fn reification_detects_disentailment() {
        let mut store = DomainStore::default();
        let b = store.new_domain(Domain::interval(0, 1));
        let x = store.new_domain(Domain::interval(0, 3));

        let mut rel = ReifiedBinary::new(b, x, Operand::Constant(7), RelOp::Equal);
        rel.propagate(&mut store).unwrap();
        assert_eq!(store.values(b), vec![0]);
    }

    #[test]
    fn fixed_control_enforces_the_negation() {
        let mut store = DomainStore::default();
        let b = store.new_domain(Domain::sparse([0]));
        let x = store.new_domain(Domain::interval(0, 9));
        let y = store.new_domain(Domain::interval(4, 4));

        // not (x <= y) means x > 4.
        let mut rel = ReifiedBinary::new(b, x, Operand::Variable(y), RelOp::LessOrEqual);
        rel.propagate(&mut store).unwrap();
        assert_eq!(store.min(x), 5);
    }
}
