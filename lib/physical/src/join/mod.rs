//! Inner joins of bindings streams.
//!
//! Join actors subscribe to a [JoinBus] and estimate their costs as [JoinCoefficients]. A
//! [JoinMediator] (see [join_mediator]) then selects the cheapest join for an [ActionJoin].

mod action;
mod actors;
mod hash_join;
mod nested_loop_join;

pub use action::{ActionJoin, BindingsOutput, JoinEntry};
pub use actors::{ActorJoinHash, ActorJoinNestedLoop, ActorJoinSingle};
pub use hash_join::HashJoin;
pub use nested_loop_join::NestedLoopJoin;

use rdf_weave_actor::{Bus, JoinCoefficientWeights, JoinCoefficients, Mediator};
use std::sync::Arc;

/// The bus on which join actors are subscribed.
pub type JoinBus = Bus<ActionJoin, JoinCoefficients, BindingsOutput>;

/// A mediator that selects a join actor.
pub type JoinMediator = Mediator<ActionJoin, JoinCoefficients, BindingsOutput>;

/// The name of the bus created by [join_bus].
pub const JOIN_BUS_NAME: &str = "bus-rdf-join";

/// Creates a [JoinBus] with all join actors of this crate.
pub fn join_bus() -> JoinBus {
    let mut bus = JoinBus::new(JOIN_BUS_NAME);
    bus.subscribe(Arc::new(ActorJoinSingle::new()));
    bus.subscribe(Arc::new(ActorJoinHash::new()));
    bus.subscribe(Arc::new(ActorJoinNestedLoop::new()));
    bus
}

/// Creates a [JoinMediator] that ranks the actors on `bus` with `weights`.
pub fn join_mediator(bus: Arc<JoinBus>, weights: JoinCoefficientWeights) -> JoinMediator {
    Mediator::join_coefficients("mediator-join", bus, weights)
}
