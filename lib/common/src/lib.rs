#![doc(test(attr(deny(warnings))))]

mod context;
pub mod error;
pub mod plan_logger;
pub mod statistics;

pub use context::keys;
pub use context::{ActionContext, ActionContextKey};
pub use error::{
    ActorError, Inapplicable, MediationError, MissingContextKey, RejectedActor, StreamError,
};
