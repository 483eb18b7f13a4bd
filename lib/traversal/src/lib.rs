#![doc(test(attr(deny(warnings))))]

//! Link queues for link traversal.
//!
//! While traversing hypermedia documents, every discovered [Link] is pushed into a [LinkQueue].
//! The queue decides in which order the links are followed. Policies like duplicate detection
//! are added by wrapping a queue into a decorator.

mod actors;
mod decorators;
mod link;
mod priority;
mod queue;

pub use actors::{
    default_link_queue_mediator, link_queue_mediator, ActionLinkQueue, ActorLinkQueueFifo,
    ActorLinkQueuePriority, ActorLinkQueueWrapperFilterDuplicates, LinkQueueBus,
    LinkQueueMediator, LinkQueueOutput, LinkQueueTest, LINK_QUEUE_COMPARATOR,
    LINK_QUEUE_FILTER_DUPLICATES_WRAPPED,
};
pub use decorators::{LinkQueueFilterDuplicates, LinkQueueLimitCount, LinkQueueStatistics};
pub use link::Link;
pub use priority::{metadata_number_comparator, LinkComparator, LinkQueuePriority};
pub use queue::{LinkQueue, LinkQueueFifo, LinkQueueLifo};
