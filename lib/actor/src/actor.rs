use async_trait::async_trait;
use rdf_weave_common::{ActionContext, ActorError, Inapplicable};
use std::fmt::Debug;
use std::sync::Arc;

/// A message that is published on a [Bus](crate::Bus).
///
/// Actions are immutable once they are submitted. They are cloned by mediators that run more
/// than one actor for the same action.
pub trait Action: Clone + Send + Sync + 'static {
    /// Returns the context of this action.
    fn context(&self) -> &ActionContext;
}

/// The outcome of testing whether an actor can handle an action.
///
/// On success, the result carries the bus-specific capability description (e.g., the expected
/// costs of a join). On failure, it carries the reason why the action cannot be handled.
pub type TestResult<T> = Result<T, Inapplicable>;

/// A shared reference to an [Actor].
pub type ActorRef<A, T, O> = Arc<dyn Actor<A, T, O>>;

/// A component that can handle actions of type `A`.
///
/// Handling an action happens in two phases. [Actor::test] checks whether the actor can handle
/// the action and provides a description of the expected work, without any side effects.
/// [Actor::run] actually handles the action. Callers only call [Actor::run] after a successful
/// [Actor::test].
#[async_trait]
pub trait Actor<A, T, O>: Debug + Send + Sync {
    /// The unique name of this actor (e.g., `actor-join-hash`).
    fn name(&self) -> &str;

    /// Checks whether this actor can handle `action`.
    async fn test(&self, action: &A) -> TestResult<T>;

    /// Handles `action`.
    async fn run(&self, action: A) -> Result<O, ActorError>;
}
