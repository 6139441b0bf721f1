use crate::engine::DomainStore;
use crate::engine::VariableId;

/// A propagation step emptied some variable's domain. Recoverable: search
/// discards the current branch, compilation flips the model's sticky failure
/// flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inconsistency;

/// A primitive constraint. Propagators are stateless with respect to the
/// trail: every invocation derives its conclusions from the current domains,
/// so restoring a checkpoint requires no per-propagator undo.
pub trait Propagator: Send {
    /// Narrows domains towards consistency with this constraint. Must be
    /// sound: values are only removed when no solution of the constraint
    /// uses them, and complete assignments violating the constraint must be
    /// rejected.
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency>;

    /// The variables this constraint ranges over, used to attribute failures
    /// for the weighted-degree heuristic.
    fn variables(&self) -> Vec<VariableId>;
}
