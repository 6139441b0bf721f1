//! Compiles an [`Instance`](crate::model::Instance) into a propagation
//! [`Model`](crate::engine::Model).
//!
//! Compilation walks the declarations in source order. Domain wipeouts flip
//! the model's sticky failure flag and later declarations are skipped
//! without error, so the whole instance is always visited; structural
//! problems (unknown names, unsupported constructs) abort with a
//! [`CompileError`] instead of producing a partially correct model.

mod constraints;
mod expressions;

use fnv::FnvHashMap;
use thiserror::Error;

use crate::engine::Domain;
use crate::engine::Model;
use crate::engine::Objective;
use crate::engine::VariableId;
use crate::model::DomainSpec;
use crate::model::Expr;
use crate::model::Instance;
use crate::model::ObjectiveKind;
use crate::propagators::Linear;
use crate::propagators::LinearOp;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("no variable named '{0}' is declared")]
    UnknownVariable(Box<str>),
    #[error("variable '{0}' is declared twice")]
    DuplicateVariable(Box<str>),
    #[error("unsupported condition for {constraint} constraint")]
    UnsupportedCondition { constraint: &'static str },
    #[error("unsupported operator for {constraint} constraint")]
    UnsupportedOperator { constraint: &'static str },
    #[error("element rank 'first'/'last' is not supported")]
    UnsupportedRank,
    #[error("channel constraint with two different start indices")]
    MismatchedStartIndices,
    #[error("mismatched argument lengths for {constraint} constraint")]
    MismatchedLengths { constraint: &'static str },
    #[error("closed cardinality is not supported")]
    ClosedCardinality,
    #[error("no-overlap requires zero-length tasks to be ignored")]
    ZeroLengthsNotIgnored,
    #[error("division by zero")]
    DivisionByZero,
    #[error("derived domain [{lower}, {upper}] is too wide to materialise")]
    DomainTooWide { lower: i64, upper: i64 },
}

/// Translates one instance into a fresh model. Each worker calls this on
/// the shared immutable instance to obtain private propagation state.
pub fn compile(instance: &Instance) -> Result<Model, CompileError> {
    let mut compiler = Compiler::new();
    compiler.declare_variables(instance)?;
    for constraint in &instance.constraints {
        compiler.translate_constraint(constraint)?;
    }
    if let Some(objective) = &instance.objective {
        compiler.translate_objective(objective)?;
    }
    compiler.select_decision_variables(instance)?;
    Ok(compiler.into_model())
}

pub(crate) struct Compiler {
    model: Model,
    bindings: FnvHashMap<String, VariableId>,
}

impl Compiler {
    fn new() -> Compiler {
        Compiler {
            model: Model::new(),
            bindings: FnvHashMap::default(),
        }
    }

    fn into_model(self) -> Model {
        self.model
    }

    fn declare_variables(&mut self, instance: &Instance) -> Result<(), CompileError> {
        for declaration in &instance.variables {
            if self.bindings.contains_key(&declaration.name) {
                return Err(CompileError::DuplicateVariable(
                    declaration.name.as_str().into(),
                ));
            }
            let domain = match &declaration.domain {
                DomainSpec::Interval(lower, upper) => Domain::interval(*lower, *upper),
                DomainSpec::Values(values) => Domain::sparse(values.iter().copied()),
            };
            let id = self.model.new_variable(&declaration.name, domain);
            let _ = self.bindings.insert(declaration.name.clone(), id);
        }
        Ok(())
    }

    fn select_decision_variables(&mut self, instance: &Instance) -> Result<(), CompileError> {
        let decisions = self.lookup_all(&instance.decision)?;
        self.model.set_decision_variables(decisions);
        Ok(())
    }

    fn translate_objective(
        &mut self,
        objective: &crate::model::ObjectiveDecl,
    ) -> Result<(), CompileError> {
        let reported = match &objective.kind {
            ObjectiveKind::Variable(name) => self.lookup(name)?,
            ObjectiveKind::Sum {
                terms,
                coefficients,
            } => {
                let variables = self.compile_all(terms)?;
                let weights = match coefficients {
                    Some(coefficients) => {
                        if coefficients.len() != variables.len() {
                            return Err(CompileError::MismatchedLengths {
                                constraint: "objective",
                            });
                        }
                        coefficients.clone()
                    }
                    None => vec![1; variables.len()],
                };
                self.weighted_sum_variable(&weights, &variables)?
            }
            ObjectiveKind::Maximum(terms) => {
                let variables = self.compile_all(terms)?;
                self.maximum_variable(&variables)?
            }
            ObjectiveKind::Minimum(terms) => {
                let variables = self.compile_all(terms)?;
                self.minimum_variable(&variables)?
            }
        };
        let minimized = if objective.maximize {
            self.negated(reported)?
        } else {
            reported
        };
        self.model.set_objective(Objective {
            minimized,
            reported,
        });
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<VariableId, CompileError> {
        self.bindings
            .get(name)
            .copied()
            .ok_or_else(|| CompileError::UnknownVariable(name.into()))
    }

    fn lookup_all(&self, names: &[String]) -> Result<Vec<VariableId>, CompileError> {
        names.iter().map(|name| self.lookup(name)).collect()
    }

    fn compile_all(&mut self, expressions: &[Expr]) -> Result<Vec<VariableId>, CompileError> {
        expressions
            .iter()
            .map(|expression| self.compile_expr(expression))
            .collect()
    }

    /// A fresh variable equal to the weighted sum of the given variables.
    fn weighted_sum_variable(
        &mut self,
        weights: &[i32],
        variables: &[VariableId],
    ) -> Result<VariableId, CompileError> {
        let mut lower: i64 = 0;
        let mut upper: i64 = 0;
        for (&weight, &variable) in weights.iter().zip(variables) {
            let min = i64::from(self.model.store().min(variable));
            let max = i64::from(self.model.store().max(variable));
            let weight = i64::from(weight);
            let (a, b) = (weight * min, weight * max);
            lower += a.min(b);
            upper += a.max(b);
        }
        let result = self.auxiliary_interval(lower, upper)?;
        let mut terms: Vec<(i32, VariableId)> = weights
            .iter()
            .copied()
            .zip(variables.iter().copied())
            .collect();
        terms.push((-1, result));
        self.model
            .post(Box::new(Linear::new(terms, 0, LinearOp::Equal)));
        Ok(result)
    }
}
