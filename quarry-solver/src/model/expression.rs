use crate::basic_types::RelOp;

/// An arithmetic, relational, or logical expression tree over named model
/// variables and integer literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Variable(String),
    Constant(i32),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Nary(NaryOp, Vec<Expr>),
}

impl Expr {
    pub fn variable(name: impl Into<String>) -> Expr {
        Expr::Variable(name.into())
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn relation(op: RelOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Rel(op), lhs, rhs)
    }

    pub fn arithmetic(op: ArithOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Arith(op), lhs, rhs)
    }

    pub fn logic(op: LogicOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Logic(op), lhs, rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    AbsoluteValue,
    Square,
    /// Logical negation of a 0/1 operand.
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Produces a reified 0/1 result.
    Rel(RelOp),
    Arith(ArithOp),
    /// Truth-table operators over 0/1 operands.
    Logic(LogicOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Subtract,
    /// `|lhs - rhs|`.
    Distance,
    Multiply,
    Divide,
    Modulo,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Xor,
    Iff,
    Implies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaryOp {
    Sum,
    Product,
    Maximum,
    Minimum,
}
