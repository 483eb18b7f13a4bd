use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Indicates that an actor cannot handle an action.
///
/// This is the *expected* outcome of a failing test and is used by mediators for routing. It
/// is not an error that should be retried or reported on its own.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Inapplicable {
    /// A human-readable reason why the action cannot be handled.
    pub reason: String,
}

impl Inapplicable {
    /// Creates a new [Inapplicable] with the given `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Creates a failing result with the given `reason`.
    pub fn reject<T>(reason: impl Into<String>) -> Result<T, Self> {
        Err(Self::new(reason))
    }
}

/// An error that is emitted by a stream.
///
/// Stream errors are cheap to clone, as a single error may be observed by multiple cursors of a
/// cloned stream.
#[derive(Clone)]
pub struct StreamError(Arc<dyn Error + Send + Sync + 'static>);

impl StreamError {
    /// Wraps an arbitrary error.
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(Arc::from(error.into()))
    }

    /// Builds an error from a printable error message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::new(msg.into())
    }

    /// Returns the wrapped error.
    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl Debug for StreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StreamError").field(&self.0).finish()
    }
}

impl Display for StreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

/// Returned if a required key is not present in an [ActionContext](crate::ActionContext).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Context entry {key} is required but not available")]
pub struct MissingContextKey {
    /// The name of the missing key.
    pub key: &'static str,
}

/// An error raised while running an actor.
///
/// The kernel never swallows or retries these errors; they are propagated to the caller of the
/// mediator.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ActorError {
    /// An error raised by a stream that is consumed while running.
    #[error(transparent)]
    Stream(#[from] StreamError),
    /// A required context entry is missing.
    #[error(transparent)]
    MissingContextKey(#[from] MissingContextKey),
    /// The action passed the test but cannot be handled after all.
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    /// Any other error.
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl ActorError {
    /// Creates a failing result with an [ActorError::InvalidAction].
    pub fn invalid_action<T>(cause: impl Into<String>) -> Result<T, Self> {
        Err(ActorError::InvalidAction(cause.into()))
    }

    /// Wraps an arbitrary error.
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}

/// An actor that has been excluded from a mediation, together with the reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedActor {
    /// The name of the actor.
    pub actor: String,
    /// The reason of the rejection.
    pub reason: Inapplicable,
}

/// An error raised by a mediator.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MediationError {
    /// No actor on the bus passed the test.
    ///
    /// The error contains the rejection reason of every actor that has been considered.
    #[error("{}", format_no_applicable_actor(.mediator, .bus, .reasons))]
    NoApplicableActor {
        /// The name of the mediator.
        mediator: String,
        /// The name of the bus.
        bus: String,
        /// All rejections, in subscription order.
        reasons: Vec<RejectedActor>,
    },
    /// An actor passed the test without providing the cost that the mediator requires.
    #[error("Actor {actor} did not provide a cost required by mediator {mediator}")]
    MissingCost {
        /// The name of the mediator.
        mediator: String,
        /// The name of the actor.
        actor: String,
    },
    /// An actor provided a cost that cannot be compared (NaN).
    #[error("Actor {actor} provided the invalid cost {cost} to mediator {mediator}")]
    InvalidCost {
        /// The name of the mediator.
        mediator: String,
        /// The name of the actor.
        actor: String,
        /// The provided cost.
        cost: f64,
    },
    /// The selected actor failed while running.
    #[error(transparent)]
    Actor(#[from] ActorError),
}

fn format_no_applicable_actor(mediator: &str, bus: &str, reasons: &[RejectedActor]) -> String {
    if reasons.is_empty() {
        return format!(
            "No actors are able to reply to a message in mediator {mediator} (bus {bus} has no eligible actors)"
        );
    }

    let mut result = format!(
        "No actors are able to reply to a message in mediator {mediator} (bus {bus}). Rejections:"
    );
    for rejected in reasons {
        result.push_str("\n    ");
        result.push_str(&rejected.actor);
        result.push_str(": ");
        result.push_str(&rejected.reason.reason);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn no_applicable_actor_lists_all_reasons() {
        let error = MediationError::NoApplicableActor {
            mediator: String::from("mediator-join"),
            bus: String::from("bus-join"),
            reasons: vec![
                RejectedActor {
                    actor: String::from("actor-join-single"),
                    reason: Inapplicable::new("requires exactly one entry"),
                },
                RejectedActor {
                    actor: String::from("actor-join-hash"),
                    reason: Inapplicable::new("requires overlapping variables"),
                },
            ],
        };

        assert_snapshot!(error.to_string(), @r"
        No actors are able to reply to a message in mediator mediator-join (bus bus-join). Rejections:
            actor-join-single: requires exactly one entry
            actor-join-hash: requires overlapping variables
        ");
    }

    #[test]
    fn no_applicable_actor_without_actors() {
        let error = MediationError::NoApplicableActor {
            mediator: String::from("mediator-join"),
            bus: String::from("bus-join"),
            reasons: Vec::new(),
        };

        assert_snapshot!(error.to_string(), @"No actors are able to reply to a message in mediator mediator-join (bus bus-join has no eligible actors)");
    }

    #[test]
    fn stream_error_is_shared_between_clones() {
        let error = StreamError::msg("Source failed");
        let clone = error.clone();
        assert_eq!(error.to_string(), clone.to_string());
    }
}
