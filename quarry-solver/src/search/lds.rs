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

/// Limited-discrepancy search: iterative passes with a growing budget of
/// right (away-from-heuristic) branches. A pass only records solutions that
/// use its full budget, so no solution is reported twice across passes. The
/// loop stops once a pass was never limited by its budget, which means the
/// whole tree has been covered.
pub(crate) fn run(
    model: &mut Model,
    brancher: &mut dyn Brancher,
    deadline: Stopwatch,
    statistics: &mut SearchStatistics,
    solutions: &mut Vec<Solution>,
    bound: &mut Option<i32>,
) -> RunOutcome {
    let mut budget = 0;
    loop {
        let mut limited = false;
        let outcome = pass(
            model,
            brancher,
            deadline,
            budget,
            statistics,
            solutions,
            bound,
            &mut limited,
        );
        if outcome == RunOutcome::DeadlineReached {
            return outcome;
        }
        if !limited {
            return RunOutcome::Completed;
        }
        budget += 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn pass(
    model: &mut Model,
    brancher: &mut dyn Brancher,
    deadline: Stopwatch,
    budget: usize,
    statistics: &mut SearchStatistics,
    solutions: &mut Vec<Solution>,
    bound: &mut Option<i32>,
    limited: &mut bool,
) -> RunOutcome {
    let mut used = 0;
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
        statistics.nodes += 1;
        match brancher.next_decision(model) {
            None => {
                if used == budget {
                    record_solution(model, statistics, solutions, bound);
                }
                if !backtrack(model, &mut stack, statistics, &mut used, budget, limited, bound) {
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
                    if !backtrack(model, &mut stack, statistics, &mut used, budget, limited, bound)
                    {
                        return RunOutcome::Completed;
                    }
                }
            }
        }
    }
}

/// Like depth-first backtracking, but a right branch is only available
/// while the discrepancy budget lasts.
#[allow(clippy::too_many_arguments)]
fn backtrack(
    model: &mut Model,
    stack: &mut Vec<Frame>,
    statistics: &mut SearchStatistics,
    used: &mut usize,
    budget: usize,
    limited: &mut bool,
    bound: &Option<i32>,
) -> bool {
    while let Some(frame) = stack.last_mut() {
        if frame.explored_right {
            *used -= 1;
            model.pop_state();
            let _ = stack.pop();
            continue;
        }
        if *used >= budget {
            *limited = true;
            model.pop_state();
            let _ = stack.pop();
            continue;
        }
        frame.explored_right = true;
        *used += 1;
        let decision = frame.decision;
        model.pop_state();
        model.push_state();
        let consistent =
            model.remove(decision.variable, decision.value).is_ok() && settle(model, bound).is_ok();
        if consistent {
            return true;
        }
        statistics.failures += 1;
        *used -= 1;
        model.pop_state();
        let _ = stack.pop();
    }
    false
}
