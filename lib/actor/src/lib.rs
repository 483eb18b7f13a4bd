#![doc(test(attr(deny(warnings))))]

//! The actor kernel of RDF Weave.
//!
//! Query processing is split into small [Actor]s. Actors subscribe to a [Bus] and are selected
//! at run time by a [Mediator]. Selection happens in two phases: first, every actor on the bus
//! tests whether it can handle the action; then, the mediator runs the actor(s) chosen by its
//! [MediationStrategy].

mod actor;
mod bus;
mod cost;
mod mediator;
#[cfg(test)]
mod test_util;

pub use actor::{Action, Actor, ActorRef, TestResult};
pub use bus::{ActionObserver, Bus, TestOutcome};
pub use cost::{JoinCoefficientWeights, JoinCoefficients};
pub use mediator::{CostFn, CostOrdering, MediationStrategy, Mediator, MergeFn};
