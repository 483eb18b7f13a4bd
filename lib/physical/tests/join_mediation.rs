use futures::StreamExt;
use rdf_weave_actor::JoinCoefficientWeights;
use rdf_weave_common::ActionContext;
use rdf_weave_model::{Bindings, BindingsMetadata, Cardinality, Literal, Term, Variable};
use rdf_weave_physical::join::{
    join_bus, join_mediator, ActionJoin, ActorJoinHash, ActorJoinNestedLoop, ActorJoinSingle,
    BindingsOutput, JoinEntry,
};
use std::sync::Arc;

fn entry(variables: &[&str], cardinality: u64) -> JoinEntry {
    let variables = variables
        .iter()
        .map(|v| Variable::new_unchecked(*v))
        .collect::<Vec<_>>();
    let bindings = (0..cardinality)
        .map(|i| {
            variables
                .iter()
                .map(|v| (v.clone(), Term::from(Literal::new_simple_literal(i.to_string()))))
                .collect::<Bindings>()
        })
        .collect();
    let metadata = BindingsMetadata::new(Cardinality::exact(cardinality), variables);
    JoinEntry::new(BindingsOutput::from_bindings(bindings, metadata))
}

async fn selected_actor(entries: Vec<JoinEntry>) -> String {
    let mediator = join_mediator(Arc::new(join_bus()), JoinCoefficientWeights::default());
    let action = ActionJoin::new(entries, ActionContext::new());
    mediator
        .mediate_actor(&action)
        .await
        .unwrap()
        .name()
        .to_owned()
}

#[tokio::test]
async fn single_entry_uses_single_join() {
    let actor = selected_actor(vec![entry(&["a"], 10)]).await;
    assert_eq!(actor, ActorJoinSingle::NAME);
}

#[tokio::test]
async fn disjoint_entries_use_nested_loop_join() {
    let actor = selected_actor(vec![entry(&["a"], 10), entry(&["b"], 10)]).await;
    assert_eq!(actor, ActorJoinNestedLoop::NAME);
}

#[tokio::test]
async fn large_overlapping_entries_use_hash_join() {
    let actor = selected_actor(vec![entry(&["a"], 100), entry(&["a"], 100)]).await;
    assert_eq!(actor, ActorJoinHash::NAME);
}

#[tokio::test]
async fn small_overlapping_entries_use_nested_loop_join() {
    // 2 * 2 iterations are cheaper than blocking on 2 items.
    let actor = selected_actor(vec![entry(&["a"], 2), entry(&["a"], 2)]).await;
    assert_eq!(actor, ActorJoinNestedLoop::NAME);
}

#[tokio::test]
async fn mediated_join_produces_results() {
    let mediator = join_mediator(Arc::new(join_bus()), JoinCoefficientWeights::default());
    let action = ActionJoin::new(
        vec![entry(&["a", "b"], 50), entry(&["a"], 50)],
        ActionContext::new(),
    );

    let output = mediator.mediate(action).await.unwrap();
    assert_eq!(output.metadata.variables.len(), 2);
    assert_eq!(output.stream.count().await, 50);
}

#[tokio::test]
async fn empty_join_has_no_applicable_actor() {
    let mediator = join_mediator(Arc::new(join_bus()), JoinCoefficientWeights::default());
    let action = ActionJoin::new(Vec::new(), ActionContext::new());

    let error = mediator.mediate(action).await.unwrap_err();
    insta::assert_snapshot!(error, @r"
    No actors are able to reply to a message in mediator mediator-join (bus bus-rdf-join). Rejections:
        actor-join-single: requires exactly 1 entries, got 0
        actor-join-hash: requires exactly 2 entries, got 0
        actor-join-nested-loop: requires exactly 2 entries, got 0
    ");
}
