use log::warn;

use crate::engine::Domain;
use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// The direction and target of an optimisation run.
///
/// Maximisation is rewritten during compilation into minimising a negated
/// auxiliary variable; `reported` is the variable whose value the caller
/// sees.
#[derive(Debug, Clone, Copy)]
pub struct Objective {
    /// The variable the branch-and-bound loop minimises.
    pub minimized: VariableId,
    /// The variable whose value is reported to the caller.
    pub reported: VariableId,
}

/// A propagation model: variables, their domains, the posted propagators, and
/// a trail of domain snapshots for backtracking.
///
/// Posting is sticky. Once a propagator post fails, the model is marked
/// failed and every later post becomes a no-op, so a whole instance can be
/// compiled without interleaving error handling; the caller checks
/// [`Model::is_failed`] once at the end.
pub struct Model {
    store: DomainStore,
    names: Vec<String>,
    declared: Vec<VariableId>,
    decision: Vec<VariableId>,
    propagators: Vec<Box<dyn Propagator>>,
    trail: Vec<Vec<Domain>>,
    failed: bool,
    objective: Option<Objective>,
    failure_weights: Vec<f64>,
    auxiliary_count: usize,
}

impl Model {
    pub fn new() -> Model {
        Model {
            store: DomainStore::default(),
            names: Vec::new(),
            declared: Vec::new(),
            decision: Vec::new(),
            propagators: Vec::new(),
            trail: Vec::new(),
            failed: false,
            objective: None,
            failure_weights: Vec::new(),
            auxiliary_count: 0,
        }
    }

    /// Declares a named variable. Declared variables make up reported
    /// solutions, in declaration order.
    pub fn new_variable(&mut self, name: &str, domain: Domain) -> VariableId {
        let id = self.add_domain(domain);
        self.names.push(name.to_owned());
        self.declared.push(id);
        id
    }

    /// Creates an unnamed helper variable introduced by a decomposition. It
    /// does not appear in solutions and is never branched on directly.
    pub fn new_auxiliary(&mut self, domain: Domain) -> VariableId {
        self.auxiliary_count += 1;
        self.add_domain(domain)
    }

    fn add_domain(&mut self, domain: Domain) -> VariableId {
        if domain.is_empty() {
            // Keep the id space consistent under the sticky failure regime:
            // the variable exists but the model can never reach a solution.
            self.failed = true;
            let id = self.store.new_domain(Domain::interval(0, 0));
            self.failure_weights.push(0.0);
            return id;
        }
        let id = self.store.new_domain(domain);
        self.failure_weights.push(0.0);
        id
    }

    pub fn store(&self) -> &DomainStore {
        &self.store
    }

    pub fn declared_variables(&self) -> &[VariableId] {
        &self.declared
    }

    pub fn variable_names(&self) -> &[String] {
        &self.names
    }

    pub fn name_of(&self, variable: VariableId) -> Option<&str> {
        self.declared
            .iter()
            .position(|&declared| declared == variable)
            .map(|position| self.names[position].as_str())
    }

    /// Marks the given declared variables as the ones to branch on first.
    pub fn set_decision_variables(&mut self, variables: Vec<VariableId>) {
        self.decision = variables;
    }

    /// The branching order: decision variables first, then the remaining
    /// declared variables in declaration order.
    pub fn search_variables(&self) -> Vec<VariableId> {
        let mut ordered = self.decision.clone();
        for &variable in &self.declared {
            if !self.decision.contains(&variable) {
                ordered.push(variable);
            }
        }
        ordered
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    pub fn objective(&self) -> Option<Objective> {
        self.objective
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    pub fn failure_weight(&self, variable: VariableId) -> f64 {
        self.failure_weights[variable.index()]
    }

    /// Posts a propagator and runs propagation to a fixpoint. Sticky: a
    /// no-op on an already failed model, and failure here latches the flag.
    pub fn post(&mut self, propagator: Box<dyn Propagator>) {
        if self.failed {
            return;
        }
        self.propagators.push(propagator);
        if self.propagate().is_err() {
            self.failed = true;
        }
    }

    /// Sticky domain narrowing used while translating an instance.
    pub fn post_assign(&mut self, variable: VariableId, value: i32) {
        self.post_narrowing(|store| store.assign(variable, value));
    }

    pub fn post_remove(&mut self, variable: VariableId, value: i32) {
        self.post_narrowing(|store| store.remove(variable, value));
    }

    pub fn post_remove_below(&mut self, variable: VariableId, bound: i32) {
        self.post_narrowing(|store| store.remove_below(variable, bound));
    }

    pub fn post_remove_above(&mut self, variable: VariableId, bound: i32) {
        self.post_narrowing(|store| store.remove_above(variable, bound));
    }

    fn post_narrowing(
        &mut self,
        operation: impl FnOnce(&mut DomainStore) -> Result<(), Inconsistency>,
    ) {
        if self.failed {
            return;
        }
        let outcome = operation(&mut self.store).and_then(|_| self.propagate());
        if outcome.is_err() {
            self.failed = true;
        }
    }

    /// Non-sticky narrowing used by search; failures are reported to the
    /// caller and recovered by restoring a checkpoint.
    pub fn assign(&mut self, variable: VariableId, value: i32) -> Result<(), Inconsistency> {
        self.store.assign(variable, value)
    }

    pub fn remove(&mut self, variable: VariableId, value: i32) -> Result<(), Inconsistency> {
        self.store.remove(variable, value)
    }

    pub fn remove_above(&mut self, variable: VariableId, bound: i32) -> Result<(), Inconsistency> {
        self.store.remove_above(variable, bound)
    }

    /// Runs all propagators to a fixpoint. The generation counter of the
    /// store detects quiescence; a failing propagator bumps the failure
    /// weights of its variables before the error is reported.
    pub fn propagate(&mut self) -> Result<(), Inconsistency> {
        loop {
            let generation = self.store.generation();
            for propagator in self.propagators.iter_mut() {
                if let Err(inconsistency) = propagator.propagate(&mut self.store) {
                    for variable in propagator.variables() {
                        self.failure_weights[variable.index()] += 1.0;
                    }
                    return Err(inconsistency);
                }
            }
            if self.store.generation() == generation {
                return Ok(());
            }
        }
    }

    /// Saves a checkpoint of every domain.
    pub fn push_state(&mut self) {
        self.trail.push(self.store.snapshot());
    }

    /// Restores the most recent checkpoint. Logs and ignores a pop without a
    /// matching push.
    pub fn pop_state(&mut self) {
        match self.trail.pop() {
            Some(snapshot) => self.store.restore(snapshot),
            None => warn!("attempt to restore state without a saved checkpoint"),
        }
    }

    pub fn depth(&self) -> usize {
        self.trail.len()
    }
}

impl Default for Model {
    fn default() -> Model {
        Model::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Model;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Inconsistency;
    use crate::engine::Propagator;
    use crate::engine::VariableId;

    struct LessThan {
        x: VariableId,
        y: VariableId,
    }

    impl Propagator for LessThan {
        fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
            store.remove_above(self.x, store.max(self.y) - 1)?;
            store.remove_below(self.y, store.min(self.x) + 1)
        }

        fn variables(&self) -> Vec<VariableId> {
            vec![self.x, self.y]
        }
    }

    #[test]
    fn posting_runs_to_fixpoint() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 5));
        let y = model.new_variable("y", Domain::interval(0, 5));
        let z = model.new_variable("z", Domain::interval(0, 5));

        model.post(Box::new(LessThan { x, y }));
        model.post(Box::new(LessThan { x: y, y: z }));

        assert!(!model.is_failed());
        assert_eq!(model.store().max(x), 3);
        assert_eq!(model.store().min(z), 2);
    }

    #[test]
    fn failed_posts_are_sticky() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 5));
        let y = model.new_variable("y", Domain::interval(0, 5));

        model.post_remove_above(x, 0);
        model.post_remove_above(y, 0);
        // x < y is now impossible.
        model.post(Box::new(LessThan { x, y }));
        assert!(model.is_failed());

        // Further posts must not panic or resurrect the model.
        model.post_assign(x, 3);
        model.post(Box::new(LessThan { x: y, y: x }));
        assert!(model.is_failed());
    }

    #[test]
    fn state_restores_domains() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 5));

        model.push_state();
        model.assign(x, 2).unwrap();
        assert!(model.store().is_fixed(x));
        model.pop_state();
        assert_eq!(model.store().size(x), 6);
    }

    #[test]
    fn failure_bumps_weights() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 1));
        let y = model.new_variable("y", Domain::interval(0, 1));
        model.post(Box::new(LessThan { x, y }));
        assert!(!model.is_failed());

        model.push_state();
        assert!(model.assign(y, 0).is_ok());
        assert!(model.propagate().is_err());
        model.pop_state();

        assert!(model.failure_weight(x) > 0.0);
        assert!(model.failure_weight(y) > 0.0);
    }

    #[test]
    fn empty_declaration_fails_the_model() {
        let mut model = Model::new();
        let _ = model.new_variable("x", Domain::sparse([]));
        assert!(model.is_failed());
    }

    #[test]
    fn search_variables_put_decisions_first() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 1));
        let y = model.new_variable("y", Domain::interval(0, 1));
        let z = model.new_variable("z", Domain::interval(0, 1));
        model.set_decision_variables(vec![z]);

        assert_eq!(model.search_variables(), vec![z, x, y]);
    }
}
