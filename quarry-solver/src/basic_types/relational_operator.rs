/// The six relational comparison operators used by conditions and reified
/// relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Equal,
    NotEqual,
    LessOrEqual,
    LessThan,
    GreaterOrEqual,
    GreaterThan,
}

impl RelOp {
    /// Evaluates `lhs <op> rhs`.
    pub fn holds(self, lhs: i32, rhs: i32) -> bool {
        match self {
            RelOp::Equal => lhs == rhs,
            RelOp::NotEqual => lhs != rhs,
            RelOp::LessOrEqual => lhs <= rhs,
            RelOp::LessThan => lhs < rhs,
            RelOp::GreaterOrEqual => lhs >= rhs,
            RelOp::GreaterThan => lhs > rhs,
        }
    }

    /// The operator accepting exactly the pairs this operator rejects.
    pub fn negated(self) -> RelOp {
        match self {
            RelOp::Equal => RelOp::NotEqual,
            RelOp::NotEqual => RelOp::Equal,
            RelOp::LessOrEqual => RelOp::GreaterThan,
            RelOp::LessThan => RelOp::GreaterOrEqual,
            RelOp::GreaterOrEqual => RelOp::LessThan,
            RelOp::GreaterThan => RelOp::LessOrEqual,
        }
    }

    /// The operator such that `lhs <op> rhs` iff `rhs <flipped op> lhs`.
    pub fn flipped(self) -> RelOp {
        match self {
            RelOp::Equal => RelOp::Equal,
            RelOp::NotEqual => RelOp::NotEqual,
            RelOp::LessOrEqual => RelOp::GreaterOrEqual,
            RelOp::LessThan => RelOp::GreaterThan,
            RelOp::GreaterOrEqual => RelOp::LessOrEqual,
            RelOp::GreaterThan => RelOp::LessThan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RelOp;

    const ALL: [RelOp; 6] = [
        RelOp::Equal,
        RelOp::NotEqual,
        RelOp::LessOrEqual,
        RelOp::LessThan,
        RelOp::GreaterOrEqual,
        RelOp::GreaterThan,
    ];

    #[test]
    fn negation_is_complementary() {
        for op in ALL {
            for lhs in -2..=2 {
                for rhs in -2..=2 {
                    assert_ne!(op.holds(lhs, rhs), op.negated().holds(lhs, rhs));
                }
            }
        }
    }

    #[test]
    fn flipping_swaps_the_arguments() {
        for op in ALL {
            for lhs in -2..=2 {
                for rhs in -2..=2 {
                    assert_eq!(op.holds(lhs, rhs), op.flipped().holds(rhs, lhs));
                }
            }
        }
    }
}
