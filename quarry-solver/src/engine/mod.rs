//! The finite-domain propagation engine: explicit integer domains, the domain
//! store with its modification counter, the propagator interface, and the
//! trailing [`Model`] that ties them together.

mod domain;
mod model;
mod propagation;
mod store;

pub use domain::Domain;
pub use model::Model;
pub use model::Objective;
pub use propagation::Inconsistency;
pub use propagation::Propagator;
pub use store::DomainStore;
pub use store::VariableId;
