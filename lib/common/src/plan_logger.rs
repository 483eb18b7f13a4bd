use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Additional information attached to a node of the physical query plan.
pub type PlanMetadata = Map<String, Value>;

/// Identifies a node in the physical query plan.
///
/// Operator actors allocate a new id for every operator they instantiate and refer to the id of
/// their parent operator when logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanNodeId(u64);

impl PlanNodeId {
    /// Allocates a new, process-wide unique [PlanNodeId].
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Collects the physical operators that are instantiated while evaluating a query.
///
/// Operator actors (e.g., join actors) call [Self::log_operation] each time they create an
/// operator. The logger builds a tree from these calls that can be used for diagnosing the
/// selected plan.
pub trait PhysicalQueryPlanLogger: Debug + Send + Sync {
    /// Logs the instantiation of an operator.
    ///
    /// - `logical_operator`: the name of the logical operator (e.g., `join-inner`).
    /// - `physical_operator`: the name of the chosen algorithm (e.g., `nested-loop`), if any.
    /// - `node`: the id of the new plan node.
    /// - `parent`: the id of the parent plan node, if known.
    /// - `actor`: the name of the actor that instantiated the operator.
    #[allow(clippy::too_many_arguments, reason = "Mirrors the logging hook")]
    fn log_operation(
        &self,
        logical_operator: &str,
        physical_operator: Option<&str>,
        node: PlanNodeId,
        parent: Option<PlanNodeId>,
        actor: &str,
        metadata: PlanMetadata,
    );

    /// Serializes the logged plan into a JSON tree.
    fn to_json(&self) -> Value;
}

#[derive(Debug)]
struct PlanNode {
    logical_operator: String,
    physical_operator: Option<String>,
    actor: String,
    metadata: PlanMetadata,
    children: Vec<PlanNodeId>,
}

#[derive(Debug, Default)]
struct PlanLoggerState {
    root: Option<PlanNodeId>,
    nodes: FxHashMap<PlanNodeId, PlanNode>,
}

/// A [PhysicalQueryPlanLogger] that keeps the plan in memory.
///
/// The first logged node becomes the root. Nodes whose parent is unknown are kept, but are only
/// part of the serialized tree if they are the root.
#[derive(Debug, Default)]
pub struct MemoryPhysicalQueryPlanLogger {
    state: Mutex<PlanLoggerState>,
}

impl MemoryPhysicalQueryPlanLogger {
    /// Creates a new empty [MemoryPhysicalQueryPlanLogger].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of logged nodes.
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Returns whether no node has been logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the plan as an indented list of operators.
    pub fn to_compact_string(&self) -> String {
        CompactPlan(&self.lock()).to_string()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlanLoggerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PhysicalQueryPlanLogger for MemoryPhysicalQueryPlanLogger {
    fn log_operation(
        &self,
        logical_operator: &str,
        physical_operator: Option<&str>,
        node: PlanNodeId,
        parent: Option<PlanNodeId>,
        actor: &str,
        metadata: PlanMetadata,
    ) {
        let mut state = self.lock();
        let plan_node = PlanNode {
            logical_operator: logical_operator.to_owned(),
            physical_operator: physical_operator.map(ToOwned::to_owned),
            actor: actor.to_owned(),
            metadata,
            children: Vec::new(),
        };

        if let Some(previous) = state.nodes.insert(node, plan_node) {
            // Re-logging a node replaces its description but keeps the known children.
            if let Some(new) = state.nodes.get_mut(&node) {
                new.children = previous.children;
            }
        }
        if state.root.is_none() {
            state.root = Some(node);
        }
        if let Some(parent) = parent {
            if let Some(parent) = state.nodes.get_mut(&parent) {
                if !parent.children.contains(&node) {
                    parent.children.push(node);
                }
            }
        }
    }

    fn to_json(&self) -> Value {
        let state = self.lock();
        match state.root {
            None => Value::Object(Map::new()),
            Some(root) => node_to_json(&state, root),
        }
    }
}

fn node_to_json(state: &PlanLoggerState, id: PlanNodeId) -> Value {
    let Some(node) = state.nodes.get(&id) else {
        return Value::Null;
    };

    let mut object = Map::new();
    object.insert(
        String::from("logical"),
        Value::String(node.logical_operator.clone()),
    );
    if let Some(physical) = &node.physical_operator {
        object.insert(String::from("physical"), Value::String(physical.clone()));
    }
    object.insert(String::from("actor"), Value::String(node.actor.clone()));
    for (key, value) in &node.metadata {
        object.insert(key.clone(), value.clone());
    }
    if !node.children.is_empty() {
        let children = node
            .children
            .iter()
            .map(|child| node_to_json(state, *child))
            .collect();
        object.insert(String::from("children"), Value::Array(children));
    }
    Value::Object(object)
}

/// Renders one plan node per line, indented by its depth.
struct CompactPlan<'a>(&'a PlanLoggerState);

impl Display for CompactPlan<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0.root {
            Some(root) => write_compact(f, self.0, root, 0),
            None => Ok(()),
        }
    }
}

fn write_compact(
    f: &mut Formatter<'_>,
    state: &PlanLoggerState,
    id: PlanNodeId,
    depth: usize,
) -> std::fmt::Result {
    let Some(node) = state.nodes.get(&id) else {
        return Ok(());
    };

    if depth > 0 {
        f.write_str("\n")?;
    }
    write!(f, "{}{}", "  ".repeat(depth), node.logical_operator)?;
    if let Some(physical) = &node.physical_operator {
        write!(f, "({physical})")?;
    }
    for (key, value) in &node.metadata {
        write!(f, " {key}={value}")?;
    }

    for child in &node.children {
        write_compact(f, state, *child, depth + 1)?;
    }
    Ok(())
}
