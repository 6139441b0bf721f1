//! The parallel search orchestrator.
//!
//! `solve` compiles the instance once, decomposes it into prefix tuples,
//! splits those into one share per worker, and runs one fully isolated
//! search per share under a shared wall-clock deadline. Workers never share
//! propagation state: each one recompiles the immutable instance and posts
//! its share as a table constraint on the prefix. Results are gathered and
//! concatenated in worker-index order.

use std::thread;
use std::time::Duration;

use itertools::Itertools;
use log::debug;

use crate::basic_types::SearchStatistics;
use crate::basic_types::Solution;
use crate::basic_types::Stopwatch;
use crate::branching::brancher_for;
use crate::branching::BeliefOptions;
use crate::branching::Heuristic;
use crate::compiler::compile;
use crate::compiler::CompileError;
use crate::decomposition::decompose;
use crate::decomposition::partition;
use crate::engine::Model;
use crate::model::Instance;
use crate::propagators::Table;
use crate::search::run_search;
use crate::search::RestartOptions;
use crate::search::SearchMode;

/// Everything a run needs beyond the instance itself.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    pub heuristic: Heuristic,
    pub mode: SearchMode,
    pub restart: RestartOptions,
    pub belief: BeliefOptions,
    pub timeout: Duration,
    pub workers: usize,
    /// Base seed; worker `i` derives its own seed from this plus `i`.
    pub random_seed: u64,
}

impl Default for SolveOptions {
    fn default() -> SolveOptions {
        SolveOptions {
            heuristic: Heuristic::default(),
            mode: SearchMode::default(),
            restart: RestartOptions::default(),
            belief: BeliefOptions::default(),
            timeout: Duration::from_secs(30),
            workers: 4,
            random_seed: 0,
        }
    }
}

/// The typed result one worker exports when it finishes.
#[derive(Debug, Clone)]
pub struct WorkerResult {
    pub worker: usize,
    pub statistics: SearchStatistics,
    pub solutions: Vec<Solution>,
}

/// The aggregated outcome of a run: folded statistics, all solutions in
/// worker-index order, and the per-worker statistics for reporting.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub statistics: SearchStatistics,
    pub solutions: Vec<Solution>,
    pub worker_statistics: Vec<SearchStatistics>,
}

impl SolveOutcome {
    fn empty_completed() -> SolveOutcome {
        SolveOutcome {
            statistics: SearchStatistics {
                completed: true,
                ..SearchStatistics::default()
            },
            solutions: Vec::new(),
            worker_statistics: Vec::new(),
        }
    }
}

/// Compiles, decomposes, and solves the instance with a pool of isolated
/// workers. Structural compilation problems are reported; an infeasible
/// instance yields a completed outcome with no solutions.
pub fn solve(instance: &Instance, options: &SolveOptions) -> Result<SolveOutcome, CompileError> {
    let deadline = Stopwatch::starting_now(options.timeout);
    let workers = options.workers.max(1);

    let mut root = compile(instance)?;
    if root.is_failed() {
        return Ok(SolveOutcome::empty_completed());
    }
    let decomposition = decompose(&mut root, workers);
    if root.is_failed() {
        return Ok(SolveOutcome::empty_completed());
    }
    let shares = partition(&decomposition.tuples, workers);
    debug!(
        "decomposed at depth {} into {} tuples over {workers} workers",
        decomposition.depth,
        decomposition.tuples.len()
    );

    // Compile the worker models up front so every structural error
    // surfaces on the calling thread.
    let mut models = Vec::with_capacity(workers);
    for _ in 0..workers {
        models.push(compile(instance)?);
    }

    let results: Vec<WorkerResult> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for (worker, (model, share)) in models.into_iter().zip(&shares).enumerate() {
            let depth = decomposition.depth;
            let handle =
                scope.spawn(move || run_worker(worker, model, share, depth, options, deadline));
            handles.push(handle);
        }
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect()
    });

    let mut statistics = SearchStatistics {
        completed: true,
        ..SearchStatistics::default()
    };
    let mut solutions = Vec::new();
    let mut worker_statistics = Vec::with_capacity(results.len());
    for result in results {
        statistics.accumulate(&result.statistics);
        worker_statistics.push(result.statistics);
        solutions.extend(result.solutions);
    }
    Ok(SolveOutcome {
        statistics,
        solutions,
        worker_statistics,
    })
}

fn run_worker(
    worker: usize,
    mut model: Model,
    share: &[Vec<i32>],
    depth: usize,
    options: &SolveOptions,
    deadline: Stopwatch,
) -> WorkerResult {
    if depth > 0 {
        if share.is_empty() {
            return WorkerResult {
                worker,
                statistics: SearchStatistics {
                    completed: true,
                    ..SearchStatistics::default()
                },
                solutions: Vec::new(),
            };
        }
        let prefix = model.search_variables()[..depth].to_vec();
        model.post(Box::new(Table::new(prefix, share.to_vec())));
    }
    let seed = options.random_seed.wrapping_add(worker as u64);
    let mut brancher = brancher_for(options.heuristic, options.belief, seed);
    let result = run_search(
        &mut model,
        brancher.as_mut(),
        options.mode,
        &options.restart,
        deadline,
    );
    debug!("worker {worker}: {}", result.statistics);
    WorkerResult {
        worker,
        statistics: result.statistics,
        solutions: result.solutions,
    }
}

/// One line per solution: `name=value` pairs in declaration order, followed
/// by the objective scalar when the model optimizes.
pub fn render_solution(names: &[String], solution: &Solution) -> String {
    let assignment = names
        .iter()
        .zip(solution.values())
        .map(|(name, value)| format!("{name}={value}"))
        .join(" ");
    match solution.objective() {
        Some(value) => format!("{assignment} (objective {value})"),
        None => assignment,
    }
}

#[cfg(test)]
mod tests {
    use super::render_solution;
    use super::solve;
    use super::SolveOptions;
    use crate::basic_types::Solution;
    use crate::model::ConstraintDecl;
    use crate::model::DomainSpec;
    use crate::model::Expr;
    use crate::model::Instance;
    use crate::model::ObjectiveDecl;
    use crate::model::ObjectiveKind;
    use crate::model::VariableDecl;

    fn all_different_instance(count: usize, upper: i32) -> Instance {
        let names: Vec<String> = (0..count).map(|index| format!("v{index}")).collect();
        Instance {
            variables: names
                .iter()
                .map(|name| VariableDecl {
                    name: name.clone(),
                    domain: DomainSpec::Interval(0, upper),
                })
                .collect(),
            constraints: vec![ConstraintDecl::AllDifferent(
                names.iter().map(Expr::variable).collect(),
            )],
            ..Instance::default()
        }
    }

    fn sorted_values(outcome: &super::SolveOutcome) -> Vec<Vec<i32>> {
        let mut values: Vec<Vec<i32>> = outcome
            .solutions
            .iter()
            .map(|solution| solution.values().to_vec())
            .collect();
        values.sort();
        values
    }

    #[test]
    fn worker_counts_agree_on_the_solution_set() {
        let instance = all_different_instance(3, 2);
        let mut baseline = None;
        for workers in [1, 2, 3, 5] {
            let options = SolveOptions {
                workers,
                ..SolveOptions::default()
            };
            let outcome = solve(&instance, &options).unwrap();
            assert!(outcome.statistics.completed, "workers={workers}");
            assert_eq!(outcome.solutions.len(), 6, "workers={workers}");
            let values = sorted_values(&outcome);
            match &baseline {
                None => baseline = Some(values),
                Some(expected) => assert_eq!(&values, expected, "workers={workers}"),
            }
        }
    }

    #[test]
    fn infeasible_instance_completes_without_solutions() {
        let instance = all_different_instance(4, 2);
        let outcome = solve(&instance, &SolveOptions::default()).unwrap();
        assert!(outcome.statistics.completed);
        assert!(outcome.solutions.is_empty());
    }

    #[test]
    fn maximization_reports_the_original_scale() {
        let instance = Instance {
            variables: vec![VariableDecl {
                name: "x".to_owned(),
                domain: DomainSpec::Interval(0, 5),
            }],
            objective: Some(ObjectiveDecl {
                maximize: true,
                kind: ObjectiveKind::Variable("x".to_owned()),
            }),
            ..Instance::default()
        };
        let options = SolveOptions {
            workers: 1,
            ..SolveOptions::default()
        };
        let outcome = solve(&instance, &options).unwrap();
        assert!(outcome.statistics.completed);
        let best = outcome.solutions.last().unwrap();
        assert_eq!(best.objective(), Some(5));
        assert_eq!(best.values(), &[5]);
    }

    #[test]
    fn rendering_lists_names_in_order() {
        let names = vec!["a".to_owned(), "b".to_owned()];
        let solution = Solution::new(vec![3, 7], Some(10));
        assert_eq!(render_solution(&names, &solution), "a=3 b=7 (objective 10)");
    }
}
