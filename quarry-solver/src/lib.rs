//! A constraint-model compiler and decomposition-based parallel solver.
//!
//! An [`Instance`](model::Instance) declares finite-domain integer
//! variables, constraints, and an optional objective. The
//! [`compiler`] lowers it into a propagation [`Model`](engine::Model), the
//! [`decomposition`] planner splits the search space into prefix tuples,
//! and [`parallel::solve`] runs one isolated search per tuple share under a
//! shared deadline, with the variable/value ordering picked from the
//! [`branching`] strategy set.
//!
//! ```
//! use quarry_solver::model::{ConstraintDecl, DomainSpec, Expr, Instance, VariableDecl};
//! use quarry_solver::parallel::{solve, SolveOptions};
//!
//! let names = ["x", "y", "z"];
//! let instance = Instance {
//!     variables: names
//!         .iter()
//!         .map(|name| VariableDecl {
//!             name: (*name).to_owned(),
//!             domain: DomainSpec::Interval(0, 2),
//!         })
//!         .collect(),
//!     constraints: vec![ConstraintDecl::AllDifferent(
//!         names.iter().map(|name| Expr::variable(*name)).collect(),
//!     )],
//!     ..Instance::default()
//! };
//!
//! let outcome = solve(&instance, &SolveOptions::default()).unwrap();
//! assert!(outcome.statistics.completed);
//! assert_eq!(outcome.solutions.len(), 6);
//! ```

pub mod basic_types;
pub mod branching;
pub mod compiler;
pub mod decomposition;
pub mod engine;
pub mod model;
pub mod parallel;
pub mod propagators;
pub mod search;
