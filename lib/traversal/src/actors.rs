use crate::{
    LinkComparator, LinkQueue, LinkQueueFifo, LinkQueueFilterDuplicates, LinkQueuePriority,
    LinkQueueStatistics,
};
use async_trait::async_trait;
use rdf_weave_actor::{Action, Actor, Bus, MediationStrategy, Mediator, TestResult};
use rdf_weave_common::keys::STATISTIC_DISCOVERED_LINKS;
use rdf_weave_common::{ActionContext, ActionContextKey, ActorError, Inapplicable};
use std::sync::Arc;

/// The comparator used by [ActorLinkQueuePriority].
pub const LINK_QUEUE_COMPARATOR: ActionContextKey<LinkComparator> =
    ActionContextKey::new("linkQueue:comparator");

/// Marks that the link queue is being created by [ActorLinkQueueWrapperFilterDuplicates].
pub const LINK_QUEUE_FILTER_DUPLICATES_WRAPPED: ActionContextKey<bool> =
    ActionContextKey::new("linkQueue:filterDuplicatesWrapped");

/// Requests a new link queue for traversing links that start at `first_url`.
#[derive(Clone, Debug)]
pub struct ActionLinkQueue {
    /// The URL at which link traversal starts.
    pub first_url: String,
    context: ActionContext,
}

impl ActionLinkQueue {
    /// Creates a new [ActionLinkQueue].
    pub fn new(first_url: impl Into<String>, context: ActionContext) -> Self {
        Self {
            first_url: first_url.into(),
            context,
        }
    }

    /// Returns a copy of this action with a different context.
    #[must_use]
    pub fn with_context(&self, context: ActionContext) -> Self {
        Self {
            first_url: self.first_url.clone(),
            context,
        }
    }
}

impl Action for ActionLinkQueue {
    fn context(&self) -> &ActionContext {
        &self.context
    }
}

/// The test result of a link queue actor. The actor with the highest priority is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkQueueTest {
    /// The priority of the actor.
    pub priority: f64,
}

/// The output of the link queue bus.
pub type LinkQueueOutput = Box<dyn LinkQueue>;

/// The bus on which link queue actors are subscribed.
pub type LinkQueueBus = Bus<ActionLinkQueue, LinkQueueTest, LinkQueueOutput>;

/// A mediator that selects a link queue actor.
pub type LinkQueueMediator = Mediator<ActionLinkQueue, LinkQueueTest, LinkQueueOutput>;

/// Creates a mediator that selects the link queue actor with the highest priority.
pub fn link_queue_mediator(name: impl Into<String>, bus: Arc<LinkQueueBus>) -> LinkQueueMediator {
    let strategy = MediationStrategy::best_by_value(|test: &LinkQueueTest| Some(test.priority));
    Mediator::new(name, bus, strategy)
}

/// Creates a link queue mediator with all link queue actors of this crate.
///
/// The produced queues filter duplicate links, order links by the comparator in the context (if
/// any, FIFO otherwise), and report discovered links to the statistic in the context (if any).
pub fn default_link_queue_mediator() -> LinkQueueMediator {
    let fifo = Arc::new(ActorLinkQueueFifo::new());
    let priority = Arc::new(ActorLinkQueuePriority::new());

    let mut base = LinkQueueBus::new("bus-link-queue-base");
    base.subscribe(fifo.clone());
    base.subscribe(priority.clone());
    let base = Arc::new(link_queue_mediator("mediator-link-queue-base", Arc::new(base)));

    let mut bus = LinkQueueBus::new("bus-link-queue");
    bus.subscribe(Arc::new(ActorLinkQueueWrapperFilterDuplicates::new(base)));
    bus.subscribe(fifo);
    bus.subscribe(priority);
    link_queue_mediator("mediator-link-queue", Arc::new(bus))
}

/// Creates [LinkQueueFifo]s. Always applicable, lowest priority.
#[derive(Debug, Default)]
pub struct ActorLinkQueueFifo {}

impl ActorLinkQueueFifo {
    /// The name of this actor.
    pub const NAME: &'static str = "actor-link-queue-fifo";

    /// Creates a new [ActorLinkQueueFifo].
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Actor<ActionLinkQueue, LinkQueueTest, LinkQueueOutput> for ActorLinkQueueFifo {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn test(&self, _action: &ActionLinkQueue) -> TestResult<LinkQueueTest> {
        Ok(LinkQueueTest { priority: 0.0 })
    }

    async fn run(&self, _action: ActionLinkQueue) -> Result<LinkQueueOutput, ActorError> {
        Ok(Box::new(LinkQueueFifo::new()))
    }
}

/// Creates [LinkQueuePriority]s with the [LINK_QUEUE_COMPARATOR] of the context.
#[derive(Debug, Default)]
pub struct ActorLinkQueuePriority {}

impl ActorLinkQueuePriority {
    /// The name of this actor.
    pub const NAME: &'static str = "actor-link-queue-priority";

    /// Creates a new [ActorLinkQueuePriority].
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Actor<ActionLinkQueue, LinkQueueTest, LinkQueueOutput> for ActorLinkQueuePriority {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn test(&self, action: &ActionLinkQueue) -> TestResult<LinkQueueTest> {
        if !action.context().has(LINK_QUEUE_COMPARATOR) {
            return Inapplicable::reject("requires a link comparator in the context");
        }
        Ok(LinkQueueTest { priority: 1.0 })
    }

    async fn run(&self, action: ActionLinkQueue) -> Result<LinkQueueOutput, ActorError> {
        let comparator = action.context().get_safe(LINK_QUEUE_COMPARATOR)?;
        Ok(Box::new(LinkQueuePriority::new(Arc::clone(comparator))))
    }
}

/// Wraps the link queue of another mediator into a [LinkQueueFilterDuplicates].
///
/// If the context contains a [STATISTIC_DISCOVERED_LINKS] statistic, the queue additionally
/// reports all accepted links.
#[derive(Debug)]
pub struct ActorLinkQueueWrapperFilterDuplicates {
    mediator: Arc<LinkQueueMediator>,
}

impl ActorLinkQueueWrapperFilterDuplicates {
    /// The name of this actor.
    pub const NAME: &'static str = "actor-link-queue-wrapper-filter-duplicates";

    /// Creates a new [ActorLinkQueueWrapperFilterDuplicates] that wraps the queues created by
    /// `mediator`.
    pub fn new(mediator: Arc<LinkQueueMediator>) -> Self {
        Self { mediator }
    }
}

#[async_trait]
impl Actor<ActionLinkQueue, LinkQueueTest, LinkQueueOutput>
    for ActorLinkQueueWrapperFilterDuplicates
{
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn test(&self, action: &ActionLinkQueue) -> TestResult<LinkQueueTest> {
        if action.context().has(LINK_QUEUE_FILTER_DUPLICATES_WRAPPED) {
            return Inapplicable::reject("the link queue is already wrapped");
        }
        Ok(LinkQueueTest { priority: 100.0 })
    }

    async fn run(&self, action: ActionLinkQueue) -> Result<LinkQueueOutput, ActorError> {
        let context = action
            .context()
            .set(LINK_QUEUE_FILTER_DUPLICATES_WRAPPED, true);
        let inner = self
            .mediator
            .mediate(action.with_context(context))
            .await
            .map_err(ActorError::other)?;

        let queue = LinkQueueFilterDuplicates::new(inner);
        Ok(match action.context().get(STATISTIC_DISCOVERED_LINKS) {
            Some(statistic) => Box::new(LinkQueueStatistics::new(queue, Arc::clone(statistic))),
            None => Box::new(queue),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata_number_comparator, Link};
    use rdf_weave_common::statistics::StatisticLinkDiscovery;

    fn urls(mut queue: LinkQueueOutput) -> Vec<String> {
        std::iter::from_fn(|| queue.pop()).map(|l| l.url).collect()
    }

    #[tokio::test]
    async fn default_mediator_creates_deduplicating_fifo_queue() {
        let mediator = default_link_queue_mediator();
        let action = ActionLinkQueue::new("http://example.com/", ActionContext::new());

        let mut queue = mediator.mediate(action).await.unwrap();
        assert!(queue.push(Link::new("b"), None));
        assert!(queue.push(Link::new("a"), None));
        assert!(!queue.push(Link::new("b"), None));
        assert_eq!(urls(queue), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn comparator_in_context_selects_priority_queue() {
        let mediator = default_link_queue_mediator();
        let context =
            ActionContext::new().set(LINK_QUEUE_COMPARATOR, metadata_number_comparator("v"));
        let action = ActionLinkQueue::new("http://example.com/", context);

        let mut queue = mediator.mediate(action).await.unwrap();
        queue.push(Link::new("a").with_metadata("v", 5), None);
        queue.push(Link::new("b").with_metadata("v", 1), None);
        queue.push(Link::new("b").with_metadata("v", 0), None);
        assert_eq!(urls(queue), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn wrapper_rejects_wrapped_actions() {
        let mediator = Arc::new(default_link_queue_mediator());
        let actor = ActorLinkQueueWrapperFilterDuplicates::new(mediator);
        let context = ActionContext::new().set(LINK_QUEUE_FILTER_DUPLICATES_WRAPPED, true);

        let error = actor
            .test(&ActionLinkQueue::new("http://example.com/", context))
            .await
            .unwrap_err();
        assert_eq!(error.reason, "the link queue is already wrapped");
    }

    #[tokio::test]
    async fn priority_actor_requires_comparator() {
        let actor = ActorLinkQueuePriority::new();
        let action = ActionLinkQueue::new("http://example.com/", ActionContext::new());
        assert!(actor.test(&action).await.is_err());
    }

    #[tokio::test]
    async fn statistic_in_context_receives_links() {
        let statistic = Arc::new(StatisticLinkDiscovery::new());
        let context =
            ActionContext::new().set(STATISTIC_DISCOVERED_LINKS, Arc::clone(&statistic));
        let action = ActionLinkQueue::new("http://example.com/", context);

        let mut queue = default_link_queue_mediator().mediate(action).await.unwrap();
        let root = Link::new("http://example.com/");
        queue.push(root.clone(), None);
        queue.push(Link::new("http://example.com/a"), Some(&root));
        queue.push(Link::new("http://example.com/a"), Some(&root));

        assert_eq!(statistic.count(), 2);
    }
}
