use crate::{Action, ActorRef, TestResult};
use futures::future::join_all;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Gets notified after an actor on a [Bus] has successfully handled an action.
///
/// Observers are passive. They cannot influence which actor is selected or what it returns.
pub trait ActionObserver<A, O>: Debug + Send + Sync {
    /// The unique name of this observer.
    fn name(&self) -> &str;

    /// Called after `actor` has handled `action` and produced `output`.
    fn on_run(&self, actor: &str, action: &A, output: &O);
}

/// The test result of a single actor for a published action.
pub struct TestOutcome<A, T, O> {
    /// The tested actor.
    pub actor: ActorRef<A, T, O>,
    /// The result of [Actor::test](crate::Actor::test).
    pub result: TestResult<T>,
}

impl<A, T: Debug, O> Debug for TestOutcome<A, T, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestOutcome")
            .field("actor", &self.actor.name())
            .field("result", &self.result)
            .finish()
    }
}

type ActionIndex<A> = Arc<dyn Fn(&A) -> Option<String> + Send + Sync>;

struct Subscription<A, T, O> {
    actor: ActorRef<A, T, O>,
    index_key: Option<String>,
}

/// A named channel to which actors subscribe.
///
/// Publishing an action on the bus tests every eligible actor. The bus never runs an actor;
/// selecting and running actors is the task of a [Mediator](crate::Mediator).
///
/// A bus is built once (subscriptions require `&mut self`) and then shared, usually behind an
/// [Arc], by the mediators that publish on it.
///
/// # Indexed Buses
///
/// An indexed bus ([Bus::new_indexed]) computes an index key for every action. Actors that are
/// subscribed with a key are only tested for actions with the same key. Actors without a key
/// are tested for every action.
pub struct Bus<A, T, O> {
    name: String,
    subscriptions: Vec<Subscription<A, T, O>>,
    observers: Vec<Arc<dyn ActionObserver<A, O>>>,
    action_index: Option<ActionIndex<A>>,
}

impl<A, T, O> Bus<A, T, O>
where
    A: Action,
    T: Send + 'static,
    O: Send + 'static,
{
    /// Creates a new empty [Bus].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscriptions: Vec::new(),
            observers: Vec::new(),
            action_index: None,
        }
    }

    /// Creates a new empty indexed [Bus].
    pub fn new_indexed(
        name: impl Into<String>,
        action_index: impl Fn(&A) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            action_index: Some(Arc::new(action_index)),
            ..Self::new(name)
        }
    }

    /// Returns the name of this bus.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the subscribed actors in subscription order.
    pub fn actors(&self) -> impl Iterator<Item = &ActorRef<A, T, O>> {
        self.subscriptions.iter().map(|s| &s.actor)
    }

    /// Returns the number of subscribed actors.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns whether no actor is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Subscribes `actor` to this bus.
    ///
    /// Returns `false` if an actor with the same name is already subscribed. In this case, the
    /// existing subscription is kept.
    pub fn subscribe(&mut self, actor: ActorRef<A, T, O>) -> bool {
        self.subscribe_indexed(actor, None)
    }

    /// Subscribes `actor` to this bus. If `index_key` is given, the actor is only tested for
    /// actions with the same index key.
    pub fn subscribe_indexed(
        &mut self,
        actor: ActorRef<A, T, O>,
        index_key: Option<String>,
    ) -> bool {
        let position = self.subscriptions.len();
        self.insert(position, actor, index_key)
    }

    /// Subscribes `actor` in front of the first subscribed actor whose name is in `before`.
    ///
    /// If none of the actors in `before` is subscribed, `actor` is appended.
    pub fn subscribe_before(&mut self, actor: ActorRef<A, T, O>, before: &[&str]) -> bool {
        let position = self
            .subscriptions
            .iter()
            .position(|s| before.contains(&s.actor.name()))
            .unwrap_or(self.subscriptions.len());
        self.insert(position, actor, None)
    }

    /// Removes the actor with the given `name`. Returns whether the actor was subscribed.
    pub fn unsubscribe(&mut self, name: &str) -> bool {
        let length = self.subscriptions.len();
        self.subscriptions.retain(|s| s.actor.name() != name);
        self.subscriptions.len() != length
    }

    /// Registers an observer. Returns `false` if an observer with the same name exists.
    pub fn subscribe_observer(&mut self, observer: Arc<dyn ActionObserver<A, O>>) -> bool {
        if self.observers.iter().any(|o| o.name() == observer.name()) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// Removes the observer with the given `name`. Returns whether it was registered.
    pub fn unsubscribe_observer(&mut self, name: &str) -> bool {
        let length = self.observers.len();
        self.observers.retain(|o| o.name() != name);
        self.observers.len() != length
    }

    /// Returns whether any observer is registered.
    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    /// Tests every eligible actor for `action`.
    ///
    /// The tests run concurrently on the current task. The outcomes are returned in
    /// subscription order.
    pub async fn publish(&self, action: &A) -> Vec<TestOutcome<A, T, O>> {
        let eligible = self.eligible_actors(action);
        let results = join_all(eligible.iter().map(|actor| actor.test(action))).await;

        let outcomes = eligible
            .into_iter()
            .zip(results)
            .map(|(actor, result)| TestOutcome {
                actor: Arc::clone(actor),
                result,
            })
            .collect::<Vec<_>>();
        tracing::debug!(
            bus = %self.name,
            tested = outcomes.len(),
            passed = outcomes.iter().filter(|o| o.result.is_ok()).count(),
            "Published action"
        );
        outcomes
    }

    /// Notifies all observers that `actor` has handled `action`.
    pub fn on_run(&self, actor: &str, action: &A, output: &O) {
        for observer in &self.observers {
            observer.on_run(actor, action, output);
        }
    }

    fn eligible_actors(&self, action: &A) -> Vec<&ActorRef<A, T, O>> {
        let key = self.action_index.as_ref().and_then(|index| index(action));
        self.subscriptions
            .iter()
            .filter(|s| match (&self.action_index, &s.index_key) {
                (Some(_), Some(index_key)) => key.as_ref() == Some(index_key),
                _ => true,
            })
            .map(|s| &s.actor)
            .collect()
    }

    fn insert(
        &mut self,
        position: usize,
        actor: ActorRef<A, T, O>,
        index_key: Option<String>,
    ) -> bool {
        if self.subscriptions.iter().any(|s| s.actor.name() == actor.name()) {
            tracing::debug!(bus = %self.name, actor = actor.name(), "Actor already subscribed");
            return false;
        }
        self.subscriptions
            .insert(position, Subscription { actor, index_key });
        true
    }
}

impl<A, T, O> Debug for Bus<A, T, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("name", &self.name)
            .field(
                "actors",
                &self
                    .subscriptions
                    .iter()
                    .map(|s| s.actor.name())
                    .collect::<Vec<_>>(),
            )
            .field("observers", &self.observers.len())
            .field("indexed", &self.action_index.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{TestAction, TestActor};
    use std::sync::Mutex;

    fn bus_with(actors: &[&'static str]) -> Bus<TestAction, u32, String> {
        let mut bus = Bus::<TestAction, u32, String>::new("bus-test");
        for &name in actors {
            assert!(bus.subscribe(TestActor::passing(name, 1)));
        }
        bus
    }

    fn names(bus: &Bus<TestAction, u32, String>) -> Vec<&str> {
        bus.actors().map(|a| a.name()).collect()
    }

    #[test]
    fn subscribe_is_idempotent_per_name() {
        let mut bus = bus_with(&["a"]);
        assert!(!bus.subscribe(TestActor::passing("a", 2)));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn subscribe_before_inserts_in_front() {
        let mut bus = bus_with(&["a", "b", "c"]);
        assert!(bus.subscribe_before(TestActor::passing("x", 1), &["c", "b"]));
        assert!(bus.subscribe_before(TestActor::passing("y", 1), &["unknown"]));
        assert_eq!(names(&bus), vec!["a", "x", "b", "c", "y"]);
    }

    #[test]
    fn unsubscribe_removes_actor() {
        let mut bus = bus_with(&["a", "b"]);
        assert!(bus.unsubscribe("a"));
        assert!(!bus.unsubscribe("a"));
        assert_eq!(names(&bus), vec!["b"]);
    }

    #[tokio::test]
    async fn publish_tests_all_actors_in_order() {
        let mut bus = bus_with(&["a"]);
        bus.subscribe(TestActor::rejecting("b", "not applicable"));
        bus.subscribe(TestActor::passing("c", 3));

        let outcomes = bus.publish(&TestAction::default()).await;
        let outcomes = outcomes
            .iter()
            .map(|o| (o.actor.name(), o.result.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            outcomes,
            vec![
                ("a", Ok(1)),
                ("b", Err(rdf_weave_common::Inapplicable::new("not applicable"))),
                ("c", Ok(3)),
            ]
        );
    }

    #[tokio::test]
    async fn publish_never_runs_actors() {
        let actor = TestActor::passing("a", 1);
        let mut bus = Bus::<TestAction, u32, String>::new("bus-test");
        bus.subscribe(actor.clone());

        bus.publish(&TestAction::default()).await;
        assert_eq!(actor.runs(), 0);
    }

    #[tokio::test]
    async fn indexed_bus_only_tests_matching_actors() {
        let mut bus = Bus::<TestAction, u32, String>::new_indexed("bus-test", |action| {
            Some(action.value.to_string())
        });
        bus.subscribe_indexed(TestActor::passing("one", 1), Some(String::from("1")));
        bus.subscribe_indexed(TestActor::passing("two", 2), Some(String::from("2")));
        bus.subscribe(TestActor::passing("any", 3));

        let outcomes = bus.publish(&TestAction::new(2)).await;
        let names = outcomes.iter().map(|o| o.actor.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["two", "any"]);
    }

    #[derive(Debug, Default)]
    struct RecordingObserver {
        seen: Mutex<Vec<(String, String)>>,
    }

    impl ActionObserver<TestAction, String> for RecordingObserver {
        fn name(&self) -> &str {
            "observer-recording"
        }

        fn on_run(&self, actor: &str, _action: &TestAction, output: &String) {
            self.seen
                .lock()
                .unwrap()
                .push((actor.to_owned(), output.clone()));
        }
    }

    #[test]
    fn observers_are_notified() {
        let observer = Arc::new(RecordingObserver::default());
        let mut bus = bus_with(&["a"]);
        assert!(bus.subscribe_observer(observer.clone()));
        assert!(!bus.subscribe_observer(observer.clone()));

        bus.on_run("a", &TestAction::default(), &String::from("out"));
        assert_eq!(
            *observer.seen.lock().unwrap(),
            vec![(String::from("a"), String::from("out"))]
        );

        assert!(bus.unsubscribe_observer("observer-recording"));
        assert!(!bus.has_observers());
    }
}
