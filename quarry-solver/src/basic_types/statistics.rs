use std::fmt;

/// Counters maintained by a single search invocation. The `completed` flag
/// records whether the search exhausted its tree, as opposed to being cut off
/// by the shared deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStatistics {
    pub nodes: u64,
    pub failures: u64,
    pub solutions: u64,
    pub completed: bool,
}

impl SearchStatistics {
    /// Folds the statistics of another search into this one. The result is
    /// complete only if both searches were.
    pub fn accumulate(&mut self, other: &SearchStatistics) {
        self.nodes += other.nodes;
        self.failures += other.failures;
        self.solutions += other.solutions;
        self.completed &= other.completed;
    }
}

impl fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes: {}, failures: {}, solutions: {}, completed: {}",
            self.nodes, self.failures, self.solutions, self.completed
        )
    }
}
