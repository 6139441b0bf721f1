//! The declarative instance representation: variable declarations,
//! constraint declarations in source order, and an optional objective. An
//! [`Instance`] is immutable input to the compiler; every worker rebuilds
//! its propagation model from the same instance.

mod expression;

pub use expression::ArithOp;
pub use expression::BinaryOp;
pub use expression::Expr;
pub use expression::LogicOp;
pub use expression::NaryOp;
pub use expression::UnaryOp;

use crate::basic_types::RelOp;

/// A complete model source: declarations are compiled strictly in the order
/// they appear here.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    pub variables: Vec<VariableDecl>,
    pub constraints: Vec<ConstraintDecl>,
    pub objective: Option<ObjectiveDecl>,
    /// Names of variables the search should branch on first; empty means
    /// all declared variables in declaration order.
    pub decision: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    pub domain: DomainSpec,
}

#[derive(Debug, Clone)]
pub enum DomainSpec {
    Interval(i32, i32),
    Values(Vec<i32>),
}

/// The comparison side of condition-bearing constraints.
#[derive(Debug, Clone)]
pub enum Condition {
    Value(RelOp, i32),
    Variable(RelOp, String),
    In { min: i32, max: i32 },
    NotIn { min: i32, max: i32 },
}

/// Coefficients of a weighted sum; variable coefficients multiply their
/// term with another model variable.
#[derive(Debug, Clone)]
pub enum Coefficients {
    Constants(Vec<i32>),
    Variables(Vec<String>),
}

/// Per-value occurrence bounds of a cardinality constraint.
#[derive(Debug, Clone)]
pub enum Occurrences {
    Constants(Vec<i32>),
    Variables(Vec<String>),
    Intervals(Vec<(i32, i32)>),
}

/// The array argument of an element constraint.
#[derive(Debug, Clone)]
pub enum ElementArray {
    Variables(Vec<String>),
    Constants(Vec<i32>),
}

/// How an element index selects among several matching positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Any,
    First,
    Last,
}

#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub variable: String,
    pub start_index: i32,
    pub rank: Rank,
}

/// The load side of a bin-packing constraint.
#[derive(Debug, Clone)]
pub enum BinPackingSpec {
    /// One shared capacity bound, compared with the condition's operator.
    Capacity(Condition),
    /// An explicit capacity per bin.
    Capacities(Vec<i32>),
    /// Existing load variables, one per bin.
    Loads(Vec<String>),
}

#[derive(Debug, Clone)]
pub enum ConstraintDecl {
    /// A boolean expression tree that must hold.
    Intension(Expr),
    Extension {
        variables: Vec<String>,
        tuples: Vec<Vec<i32>>,
        positive: bool,
    },
    Sum {
        terms: Vec<Expr>,
        coefficients: Option<Coefficients>,
        condition: Condition,
    },
    AllDifferent(Vec<Expr>),
    AllDifferentMatrix(Vec<Vec<String>>),
    AllEqual(Vec<String>),
    Ordered {
        variables: Vec<String>,
        lengths: Option<Vec<i32>>,
        op: RelOp,
    },
    Lex {
        lists: Vec<Vec<String>>,
        op: RelOp,
    },
    LexMatrix {
        matrix: Vec<Vec<String>>,
        op: RelOp,
    },
    Precedence {
        variables: Vec<String>,
        /// `None` collects the ordered union of the domains.
        values: Option<Vec<i32>>,
        covered: bool,
    },
    Element {
        array: ElementArray,
        /// `None` constrains the condition value to occur somewhere.
        index: Option<IndexSpec>,
        condition: Condition,
    },
    ElementMatrix {
        matrix: Vec<Vec<i32>>,
        row: IndexSpec,
        column: IndexSpec,
        condition: Condition,
    },
    Count {
        variables: Vec<String>,
        values: Vec<i32>,
        condition: Condition,
    },
    Cardinality {
        variables: Vec<String>,
        values: Vec<i32>,
        occurrences: Occurrences,
        closed: bool,
    },
    Regular {
        variables: Vec<String>,
        /// `(from, value, to)` over symbolic state names.
        transitions: Vec<(String, i32, String)>,
        start: String,
        finals: Vec<String>,
    },
    Circuit {
        variables: Vec<String>,
        start_index: i32,
    },
    BinPacking {
        bins: Vec<String>,
        sizes: Vec<i32>,
        spec: BinPackingSpec,
    },
    Knapsack {
        variables: Vec<String>,
        weights: Vec<i32>,
        profits: Vec<i32>,
        weight_condition: Condition,
        profit_condition: Condition,
    },
    NoOverlap {
        starts: Vec<String>,
        lengths: Vec<i32>,
        zero_ignored: bool,
    },
    Cumulative {
        starts: Vec<String>,
        lengths: Vec<i32>,
        heights: Vec<i32>,
        condition: Condition,
    },
    Clause {
        positive: Vec<String>,
        negative: Vec<String>,
    },
    Maximum {
        terms: Vec<Expr>,
        condition: Condition,
    },
    Minimum {
        terms: Vec<Expr>,
        condition: Condition,
    },
    /// `list[i] = j <-> list[j] = i`.
    ChannelSelf {
        list: Vec<String>,
        start_index: i32,
    },
    ChannelPair {
        first: Vec<String>,
        first_start: i32,
        second: Vec<String>,
        second_start: i32,
    },
    /// 0/1 list where exactly the `value`-indexed entry is 1.
    ChannelValue {
        list: Vec<String>,
        start_index: i32,
        value: String,
    },
    Instantiation {
        variables: Vec<String>,
        values: Vec<i32>,
    },
}

#[derive(Debug, Clone)]
pub struct ObjectiveDecl {
    pub maximize: bool,
    pub kind: ObjectiveKind,
}

#[derive(Debug, Clone)]
pub enum ObjectiveKind {
    Variable(String),
    Sum {
        terms: Vec<Expr>,
        coefficients: Option<Vec<i32>>,
    },
    Maximum(Vec<Expr>),
    Minimum(Vec<Expr>),
}
