//! Well-known keys of the [ActionContext](crate::ActionContext).
//!
//! Other crates may define additional keys. Key names are namespaced with the component that
//! introduced them.

use crate::plan_logger::{PhysicalQueryPlanLogger, PlanNodeId};
use crate::statistics::StatisticLinkDiscovery;
use crate::ActionContextKey;
use std::sync::Arc;
use std::time::SystemTime;

/// The original query string.
pub const QUERY_STRING: ActionContextKey<String> = ActionContextKey::new("init:queryString");

/// The base IRI that is used for resolving relative IRIs.
pub const BASE_IRI: ActionContextKey<String> = ActionContextKey::new("init:baseIRI");

/// If enabled, recoverable errors (e.g., unparsable documents) are ignored.
pub const LENIENT: ActionContextKey<bool> = ActionContextKey::new("init:lenient");

/// The time at which the query evaluation started.
pub const QUERY_TIMESTAMP: ActionContextKey<SystemTime> =
    ActionContextKey::new("init:queryTimestamp");

/// The logger that collects the physical query plan.
pub const PHYSICAL_QUERY_PLAN_LOGGER: ActionContextKey<Arc<dyn PhysicalQueryPlanLogger>> =
    ActionContextKey::new("init:physicalQueryPlanLogger");

/// The plan node of the operator that issued the current action.
pub const PHYSICAL_QUERY_PLAN_NODE: ActionContextKey<PlanNodeId> =
    ActionContextKey::new("init:physicalQueryPlanNode");

/// Tracks the links that are discovered during link traversal.
pub const STATISTIC_DISCOVERED_LINKS: ActionContextKey<Arc<StatisticLinkDiscovery>> =
    ActionContextKey::new("statistics:discoveredLinks");
