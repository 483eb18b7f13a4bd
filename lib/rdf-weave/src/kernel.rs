use rdf_weave_actor::JoinCoefficientWeights;
use rdf_weave_common::{ActionContext, MediationError};
use rdf_weave_physical::join::{
    join_bus, join_mediator, ActionJoin, BindingsOutput, JoinEntry, JoinMediator,
};
use rdf_weave_traversal::{
    default_link_queue_mediator, ActionLinkQueue, LinkQueueMediator, LinkQueueOutput,
};
use serde::Deserialize;
use std::sync::Arc;

/// The options of a [Kernel].
///
/// The options can be deserialized, e.g., from a JSON configuration. Missing fields keep their
/// default values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct KernelOptions {
    /// The weights that are used to rank join actors.
    pub join_weights: JoinCoefficientWeights,
}

impl KernelOptions {
    /// Sets the join weights.
    #[must_use]
    pub fn with_join_weights(mut self, join_weights: JoinCoefficientWeights) -> Self {
        self.join_weights = join_weights;
        self
    }
}

/// The entry point into the default actors of RDF Weave.
///
/// A kernel owns one mediator per bus and a base [ActionContext] that is passed along with
/// every action. Kernels are cheap to clone; clones share their mediators.
#[derive(Clone, Debug)]
pub struct Kernel {
    join_mediator: Arc<JoinMediator>,
    link_queue_mediator: Arc<LinkQueueMediator>,
    context: ActionContext,
}

impl Kernel {
    /// Creates a new [Kernel] with default options.
    pub fn new() -> Self {
        Self::with_options(KernelOptions::default())
    }

    /// Creates a new [Kernel] with the given `options`.
    pub fn with_options(options: KernelOptions) -> Self {
        tracing::debug!(?options, "Creating kernel");
        Self {
            join_mediator: Arc::new(join_mediator(
                Arc::new(join_bus()),
                options.join_weights,
            )),
            link_queue_mediator: Arc::new(default_link_queue_mediator()),
            context: ActionContext::new(),
        }
    }

    /// Returns a kernel that passes `context` along with every action.
    #[must_use]
    pub fn with_context(&self, context: ActionContext) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    /// Returns the base context.
    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    /// Returns the join mediator.
    pub fn join_mediator(&self) -> &Arc<JoinMediator> {
        &self.join_mediator
    }

    /// Returns the link queue mediator.
    pub fn link_queue_mediator(&self) -> &Arc<LinkQueueMediator> {
        &self.link_queue_mediator
    }

    /// Joins all `entries` with the cheapest join actor.
    pub async fn join(&self, entries: Vec<JoinEntry>) -> Result<BindingsOutput, MediationError> {
        let action = ActionJoin::new(entries, self.context.clone());
        self.join_mediator.mediate(action).await
    }

    /// Creates a link queue for a traversal that starts at `first_url`.
    pub async fn link_queue(
        &self,
        first_url: impl Into<String>,
    ) -> Result<LinkQueueOutput, MediationError> {
        let action = ActionLinkQueue::new(first_url, self.context.clone());
        self.link_queue_mediator.mediate(action).await
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}
