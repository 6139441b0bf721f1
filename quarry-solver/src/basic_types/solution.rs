/// A full assignment of the declared variables of a model, recorded in
/// declaration order. The objective value is [`None`] for pure satisfaction
/// problems.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Solution {
    values: Vec<i32>,
    objective: Option<i32>,
}

impl Solution {
    pub fn new(values: Vec<i32>, objective: Option<i32>) -> Solution {
        Solution { values, objective }
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn value(&self, index: usize) -> i32 {
        self.values[index]
    }

    pub fn objective(&self) -> Option<i32> {
        self.objective
    }
}
