use crate::join::{ActionJoin, BindingsOutput, HashJoin, JoinEntry, NestedLoopJoin};
use async_trait::async_trait;
use rdf_weave_actor::{Action, Actor, JoinCoefficients, TestResult};
use rdf_weave_common::keys::{PHYSICAL_QUERY_PLAN_LOGGER, PHYSICAL_QUERY_PLAN_NODE};
use rdf_weave_common::plan_logger::{PlanMetadata, PlanNodeId};
use rdf_weave_common::{ActorError, Inapplicable};
use rdf_weave_model::{Bindings, BindingsMetadata, Cardinality};
use rdf_weave_stream::{CloneableStream, QueryStreamExt};
use serde_json::Value;

const LOGICAL_OPERATOR: &str = "join-inner";

#[allow(clippy::cast_precision_loss, reason = "Cardinalities are estimates")]
fn cardinality(entry: &JoinEntry) -> f64 {
    entry.output.metadata.cardinality.value as f64
}

fn require_entries(action: &ActionJoin, count: usize) -> TestResult<()> {
    if action.entries.len() != count {
        return Inapplicable::reject(format!(
            "requires exactly {count} entries, got {}",
            action.entries.len()
        ));
    }
    Ok(())
}

fn two_entries(entries: Vec<JoinEntry>) -> Result<(JoinEntry, JoinEntry), ActorError> {
    let Ok([left, right]) = <[JoinEntry; 2]>::try_from(entries) else {
        return ActorError::invalid_action("requires exactly 2 entries");
    };
    Ok((left, right))
}

fn joined_metadata(left: &BindingsMetadata, right: &BindingsMetadata) -> BindingsMetadata {
    let cardinality = left.cardinality.multiply(right.cardinality);
    BindingsMetadata::new(
        Cardinality::estimate(cardinality.value),
        left.union_variables(right),
    )
}

/// Logs the instantiated join into the plan logger of the context, if there is one.
fn log_join(action: &ActionJoin, physical_operator: &str, actor: &str) {
    let context = action.context();
    let Some(logger) = context.get(PHYSICAL_QUERY_PLAN_LOGGER) else {
        return;
    };

    let mut metadata = PlanMetadata::new();
    let cardinalities = action
        .entries
        .iter()
        .map(|entry| Value::from(entry.output.metadata.cardinality.value))
        .collect();
    metadata.insert(String::from("cardinalities"), Value::Array(cardinalities));
    logger.log_operation(
        LOGICAL_OPERATOR,
        Some(physical_operator),
        PlanNodeId::next(),
        context.get(PHYSICAL_QUERY_PLAN_NODE).copied(),
        actor,
        metadata,
    );
}

/// Joins two entries by comparing every pair of bindings.
///
/// Applicable to any two entries. The costs grow with the product of the input sizes, but the
/// join neither blocks nor materializes its left input.
#[derive(Debug, Default)]
pub struct ActorJoinNestedLoop {}

impl ActorJoinNestedLoop {
    /// The name of this actor.
    pub const NAME: &'static str = "actor-join-nested-loop";

    /// Creates a new [ActorJoinNestedLoop].
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Actor<ActionJoin, JoinCoefficients, BindingsOutput> for ActorJoinNestedLoop {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn test(&self, action: &ActionJoin) -> TestResult<JoinCoefficients> {
        require_entries(action, 2)?;
        let (left, right) = (&action.entries[0], &action.entries[1]);
        Ok(JoinCoefficients {
            iterations: cardinality(left) * cardinality(right),
            ..JoinCoefficients::default()
        })
    }

    async fn run(&self, action: ActionJoin) -> Result<BindingsOutput, ActorError> {
        log_join(&action, "nested-loop", Self::NAME);
        let (left, right) = two_entries(action.entries)?;
        let metadata = joined_metadata(&left.output.metadata, &right.output.metadata);

        let join = NestedLoopJoin::new(
            left.output.stream.into_sendable(),
            right.output.stream,
            |left: &Bindings, right: &Bindings| left.merge(right),
        );
        Ok(BindingsOutput::new(join.into_cloneable(), metadata))
    }
}

/// Joins two entries that share at least one variable by building a hash table over the right
/// entry.
#[derive(Debug, Default)]
pub struct ActorJoinHash {}

impl ActorJoinHash {
    /// The name of this actor.
    pub const NAME: &'static str = "actor-join-hash";

    /// Creates a new [ActorJoinHash].
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Actor<ActionJoin, JoinCoefficients, BindingsOutput> for ActorJoinHash {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn test(&self, action: &ActionJoin) -> TestResult<JoinCoefficients> {
        require_entries(action, 2)?;
        let (left, right) = (&action.entries[0], &action.entries[1]);
        if left
            .output
            .metadata
            .shared_variables(&right.output.metadata)
            .is_empty()
        {
            return Inapplicable::reject("requires overlapping variables");
        }

        Ok(JoinCoefficients {
            iterations: cardinality(left) + cardinality(right),
            persisted_items: cardinality(right),
            blocking_items: cardinality(right),
            request_time: 0.0,
        })
    }

    async fn run(&self, action: ActionJoin) -> Result<BindingsOutput, ActorError> {
        log_join(&action, "hash", Self::NAME);
        let (left, right) = two_entries(action.entries)?;
        let metadata = joined_metadata(&left.output.metadata, &right.output.metadata);
        let variables = left.output.metadata.shared_variables(&right.output.metadata);

        let join = HashJoin::new(
            left.output.stream.into_sendable(),
            right.output.stream.into_sendable(),
            variables,
        );
        Ok(BindingsOutput::new(join.into_cloneable(), metadata))
    }
}

/// Handles joins with a single entry by returning the entry.
#[derive(Debug, Default)]
pub struct ActorJoinSingle {}

impl ActorJoinSingle {
    /// The name of this actor.
    pub const NAME: &'static str = "actor-join-single";

    /// Creates a new [ActorJoinSingle].
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Actor<ActionJoin, JoinCoefficients, BindingsOutput> for ActorJoinSingle {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn test(&self, action: &ActionJoin) -> TestResult<JoinCoefficients> {
        require_entries(action, 1)?;
        Ok(JoinCoefficients::default())
    }

    async fn run(&self, action: ActionJoin) -> Result<BindingsOutput, ActorError> {
        let Some(entry) = action.entries.into_iter().next() else {
            return ActorError::invalid_action("requires exactly 1 entry");
        };
        let metadata = entry.output.metadata;
        let stream = entry.output.stream;
        Ok(BindingsOutput::new(
            stream,
            BindingsMetadata {
                cardinality: Cardinality::exact(metadata.cardinality.value),
                ..metadata
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use insta::assert_snapshot;
    use rdf_weave_common::plan_logger::{MemoryPhysicalQueryPlanLogger, PhysicalQueryPlanLogger};
    use rdf_weave_common::ActionContext;
    use rdf_weave_model::{Literal, Term, Variable};
    use std::sync::Arc;

    fn entry(variables: &[&str], rows: &[&[i32]]) -> JoinEntry {
        let variables = variables
            .iter()
            .map(|v| Variable::new_unchecked(*v))
            .collect::<Vec<_>>();
        let bindings = rows
            .iter()
            .map(|row| {
                variables
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|v| Term::from(Literal::from(*v))))
                    .collect::<Bindings>()
            })
            .collect::<Vec<_>>();
        let metadata = BindingsMetadata::new(Cardinality::exact(rows.len() as u64), variables);
        JoinEntry::new(BindingsOutput::from_bindings(bindings, metadata))
    }

    fn action(entries: Vec<JoinEntry>) -> ActionJoin {
        ActionJoin::new(entries, ActionContext::new())
    }

    async fn collect(output: BindingsOutput) -> Vec<String> {
        output
            .stream
            .map(|bindings| bindings.unwrap().to_string())
            .collect()
            .await
    }

    #[tokio::test]
    async fn nested_loop_coefficients() {
        let action = action(vec![
            entry(&["a"], &[&[1], &[2]]),
            entry(&["b"], &[&[1], &[2], &[3]]),
        ]);

        let coefficients = ActorJoinNestedLoop::new().test(&action).await.unwrap();
        assert_eq!(coefficients.iterations, 6.0);
        assert_eq!(coefficients.blocking_items, 0.0);
    }

    #[tokio::test]
    async fn nested_loop_rejects_single_entry() {
        let action = action(vec![entry(&["a"], &[&[1]])]);
        let error = ActorJoinNestedLoop::new().test(&action).await.unwrap_err();
        assert_snapshot!(error, @"requires exactly 2 entries, got 1");
    }

    #[tokio::test]
    async fn nested_loop_joins_compatible_bindings() {
        let action = action(vec![
            entry(&["a", "b"], &[&[1, 1], &[2, 2]]),
            entry(&["b", "c"], &[&[1, 3], &[2, 4], &[1, 5]]),
        ]);

        let output = ActorJoinNestedLoop::new().run(action).await.unwrap();
        assert_eq!(output.metadata.cardinality, Cardinality::estimate(6));
        assert_snapshot!(collect(output).await.join("\n"), @r#"
        {?a -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>, ?b -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>, ?c -> "3"^^<http://www.w3.org/2001/XMLSchema#integer>}
        {?a -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>, ?b -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>, ?c -> "5"^^<http://www.w3.org/2001/XMLSchema#integer>}
        {?a -> "2"^^<http://www.w3.org/2001/XMLSchema#integer>, ?b -> "2"^^<http://www.w3.org/2001/XMLSchema#integer>, ?c -> "4"^^<http://www.w3.org/2001/XMLSchema#integer>}
        "#);
    }

    #[tokio::test]
    async fn hash_requires_shared_variables() {
        let action = action(vec![entry(&["a"], &[&[1]]), entry(&["b"], &[&[1]])]);
        let error = ActorJoinHash::new().test(&action).await.unwrap_err();
        assert_snapshot!(error, @"requires overlapping variables");
    }

    #[tokio::test]
    async fn hash_coefficients() {
        let action = action(vec![
            entry(&["a"], &[&[1], &[2]]),
            entry(&["a"], &[&[1], &[2], &[3]]),
        ]);

        let coefficients = ActorJoinHash::new().test(&action).await.unwrap();
        assert_eq!(
            coefficients,
            JoinCoefficients {
                iterations: 5.0,
                persisted_items: 3.0,
                blocking_items: 3.0,
                request_time: 0.0,
            }
        );
    }

    #[tokio::test]
    async fn hash_and_nested_loop_produce_same_bindings() {
        let entries = vec![
            entry(&["a", "b"], &[&[1, 1], &[2, 2], &[3, 1]]),
            entry(&["b", "c"], &[&[1, 3], &[2, 4]]),
        ];

        let nested_loop = ActorJoinNestedLoop::new()
            .run(action(entries.clone()))
            .await
            .unwrap();
        let hash = ActorJoinHash::new().run(action(entries)).await.unwrap();

        let mut nested_loop = collect(nested_loop).await;
        let mut hash = collect(hash).await;
        nested_loop.sort();
        hash.sort();
        assert_eq!(nested_loop, hash);
        assert_eq!(hash.len(), 3);
    }

    #[tokio::test]
    async fn single_returns_entry() {
        let action = action(vec![entry(&["a"], &[&[1], &[2]])]);
        let actor = ActorJoinSingle::new();

        assert_eq!(
            actor.test(&action).await.unwrap(),
            JoinCoefficients::default()
        );
        let output = actor.run(action).await.unwrap();
        assert!(output.metadata.cardinality.is_exact());
        assert_eq!(collect(output).await.len(), 2);
    }

    #[tokio::test]
    async fn run_logs_into_plan_logger() {
        let logger = Arc::new(MemoryPhysicalQueryPlanLogger::new());
        let context = ActionContext::new().set(
            PHYSICAL_QUERY_PLAN_LOGGER,
            Arc::clone(&logger) as Arc<dyn PhysicalQueryPlanLogger>,
        );
        let action = ActionJoin::new(
            vec![entry(&["a"], &[&[1]]), entry(&["a"], &[&[1], &[2]])],
            context,
        );

        ActorJoinHash::new().run(action).await.unwrap();
        assert_snapshot!(logger.to_compact_string(), @"join-inner(hash) cardinalities=[1,2]");
    }
}
