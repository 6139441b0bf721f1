use std::time::Duration;
use std::time::Instant;

/// A shared wall-clock deadline. Every worker receives a copy with the same
/// start timestamp and polls [`Stopwatch::expired`] between nodes; the
/// deadline is never enforced by interruption.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    budget: Duration,
}

impl Stopwatch {
    pub fn starting_now(budget: Duration) -> Stopwatch {
        Stopwatch {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.budget
    }
}
