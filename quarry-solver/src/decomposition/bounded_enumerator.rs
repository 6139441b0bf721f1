use std::ops::ControlFlow;

use crate::engine::Model;
use crate::engine::VariableId;

/// Counters of one enumeration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerationStatistics {
    pub nodes: u64,
    pub failures: u64,
    pub leaves: u64,
}

/// Depth-first enumeration of every consistent assignment to a prefix of
/// variables, with full propagation at each node.
///
/// The model is restored to its entry state before `enumerate` returns,
/// whether the run completes or the leaf callback breaks it off early.
pub struct BoundedEnumerator<'a> {
    variables: &'a [VariableId],
    pub statistics: EnumerationStatistics,
}

struct Frame {
    variable: VariableId,
    values: Vec<i32>,
    next: usize,
    pushed: bool,
}

impl Frame {
    fn open(model: &Model, variable: VariableId) -> Frame {
        Frame {
            variable,
            values: model.store().values(variable),
            next: 0,
            pushed: false,
        }
    }
}

impl<'a> BoundedEnumerator<'a> {
    pub fn new(variables: &'a [VariableId]) -> BoundedEnumerator<'a> {
        BoundedEnumerator {
            variables,
            statistics: EnumerationStatistics::default(),
        }
    }

    /// Visits every consistent prefix assignment. The callback returns
    /// [`ControlFlow::Break`] to stop the enumeration.
    pub fn enumerate(
        &mut self,
        model: &mut Model,
        mut on_leaf: impl FnMut(&[i32]) -> ControlFlow<()>,
    ) {
        if model.is_failed() {
            return;
        }
        let mut assignment: Vec<i32> = Vec::with_capacity(self.variables.len());
        if self.variables.is_empty() {
            self.statistics.leaves += 1;
            let _ = on_leaf(&assignment);
            return;
        }
        let mut stack = vec![Frame::open(model, self.variables[0])];
        while let Some(top) = stack.last_mut() {
            if top.pushed {
                model.pop_state();
                let _ = assignment.pop();
                top.pushed = false;
            }
            let Some(&value) = top.values.get(top.next) else {
                let _ = stack.pop();
                continue;
            };
            top.next += 1;
            top.pushed = true;
            let variable = top.variable;

            self.statistics.nodes += 1;
            model.push_state();
            assignment.push(value);
            let consistent = model.assign(variable, value).is_ok() && model.propagate().is_ok();
            if !consistent {
                self.statistics.failures += 1;
                continue;
            }
            if stack.len() == self.variables.len() {
                self.statistics.leaves += 1;
                if on_leaf(&assignment).is_break() {
                    break;
                }
                continue;
            }
            let child = self.variables[stack.len()];
            stack.push(Frame::open(model, child));
        }
        for frame in stack.iter().rev() {
            if frame.pushed {
                model.pop_state();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use super::BoundedEnumerator;
    use crate::engine::Domain;
    use crate::engine::Model;
    use crate::propagators::AllDifferent;

    #[test]
    fn enumerates_the_cartesian_product() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 1));
        let y = model.new_variable("y", Domain::interval(0, 1));
        let z = model.new_variable("z", Domain::interval(0, 1));

        let variables = [x, y, z];
        let mut enumerator = BoundedEnumerator::new(&variables[..2]);
        let mut tuples = Vec::new();
        enumerator.enumerate(&mut model, |tuple| {
            tuples.push(tuple.to_vec());
            ControlFlow::Continue(())
        });

        assert_eq!(tuples, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
        assert_eq!(enumerator.statistics.leaves, 4);
        // The model is back in its entry state.
        assert_eq!(model.depth(), 0);
        assert_eq!(model.store().size(x), 2);
        assert_eq!(model.store().size(z), 2);
    }

    #[test]
    fn propagation_prunes_branches() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 1));
        let y = model.new_variable("y", Domain::interval(0, 1));
        model.post(Box::new(AllDifferent::new(vec![x, y])));

        let variables = [x, y];
        let mut enumerator = BoundedEnumerator::new(&variables);
        let mut tuples = Vec::new();
        enumerator.enumerate(&mut model, |tuple| {
            tuples.push(tuple.to_vec());
            ControlFlow::Continue(())
        });

        assert_eq!(tuples, vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn breaking_stops_and_unwinds() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 4));

        let variables = [x];
        let mut enumerator = BoundedEnumerator::new(&variables);
        let mut seen = 0;
        enumerator.enumerate(&mut model, |_| {
            seen += 1;
            if seen == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(seen, 2);
        assert_eq!(model.depth(), 0);
        assert_eq!(model.store().size(x), 5);
    }

    #[test]
    fn failed_model_yields_nothing() {
        let mut model = Model::new();
        let x = model.new_variable("x", Domain::interval(0, 1));
        model.post_assign(x, 9);
        assert!(model.is_failed());

        let variables = [x];
        let mut enumerator = BoundedEnumerator::new(&variables);
        let mut seen = 0;
        enumerator.enumerate(&mut model, |_| {
            seen += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(seen, 0);
    }
}
