mod relational_operator;
mod solution;
mod statistics;
mod stopwatch;

pub use relational_operator::RelOp;
pub use solution::Solution;
pub use statistics::SearchStatistics;
pub use stopwatch::Stopwatch;
