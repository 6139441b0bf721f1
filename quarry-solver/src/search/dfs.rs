use crate::basic_types::SearchStatistics;
use crate::basic_types::Solution;
use crate::basic_types::Stopwatch;
use crate::branching::Brancher;
use crate::engine::Model;
use crate::search::record_solution;
use crate::search::settle;
use crate::search::unwind;
use crate::search::Frame;
use crate::search::RunOutcome;

/// One depth-first pass, bounded by the deadline and an optional failure
/// cutoff. The model is back at the root when this returns.
pub(crate) fn run(
    model: &mut Model,
    brancher: &mut dyn Brancher,
    deadline: Stopwatch,
    failure_cutoff: Option<u64>,
    statistics: &mut SearchStatistics,
    solutions: &mut Vec<Solution>,
    bound: &mut Option<i32>,
) -> RunOutcome {
    let mut run_failures: u64 = 0;
    let mut stack: Vec<Frame> = Vec::new();
    if settle(model, bound).is_err() {
        statistics.failures += 1;
        return RunOutcome::Completed;
    }
    loop {
        if deadline.expired() {
            unwind(model, stack.len());
            return RunOutcome::DeadlineReached;
        }
        if failure_cutoff.is_some_and(|cutoff| run_failures >= cutoff) {
            unwind(model, stack.len());
            return RunOutcome::CutoffReached;
        }
        statistics.nodes += 1;
        match brancher.next_decision(model) {
            None => {
                record_solution(model, statistics, solutions, bound);
                if !backtrack(model, &mut stack, statistics, &mut run_failures, bound) {
                    return RunOutcome::Completed;
                }
            }
            Some(decision) => {
                model.push_state();
                stack.push(Frame::new(decision));
                let consistent = model.assign(decision.variable, decision.value).is_ok()
                    && settle(model, bound).is_ok();
                if !consistent {
                    statistics.failures += 1;
                    run_failures += 1;
                    if !backtrack(model, &mut stack, statistics, &mut run_failures, bound) {
                        return RunOutcome::Completed;
                    }
                }
            }
        }
    }
}

/// Retreats to the deepest frame with an untried right branch and applies
/// it. Returns false when the root is exhausted.
fn backtrack(
    model: &mut Model,
    stack: &mut Vec<Frame>,
    statistics: &mut SearchStatistics,
    run_failures: &mut u64,
    bound: &Option<i32>,
) -> bool {
    while let Some(frame) = stack.last_mut() {
        if frame.explored_right {
            model.pop_state();
            let _ = stack.pop();
            continue;
        }
        frame.explored_right = true;
        let decision = frame.decision;
        model.pop_state();
        model.push_state();
        let consistent =
            model.remove(decision.variable, decision.value).is_ok() && settle(model, bound).is_ok();
        if consistent {
            return true;
        }
        statistics.failures += 1;
        *run_failures += 1;
        model.pop_state();
        let _ = stack.pop();
    }
    false
}
