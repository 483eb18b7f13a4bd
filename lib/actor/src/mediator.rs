use crate::{Action, ActorRef, Bus, JoinCoefficientWeights, JoinCoefficients};
use futures::future::try_join_all;
use rdf_weave_common::{ActorError, MediationError, RejectedActor};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Extracts the cost from a test result. [None] indicates that the result carries no cost.
pub type CostFn<T> = Arc<dyn Fn(&T) -> Option<f64> + Send + Sync>;

/// Combines the outputs of multiple actors into a single output.
pub type MergeFn<O> = Arc<dyn Fn(Vec<O>) -> Result<O, ActorError> + Send + Sync>;

/// Defines whether a [MediationStrategy::BestByCost] mediator selects the lowest or the highest
/// cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CostOrdering {
    /// Select the actor with the lowest cost.
    #[default]
    Minimize,
    /// Select the actor with the highest value (e.g., a priority).
    Maximize,
}

impl CostOrdering {
    fn is_better(self, candidate: f64, best: f64) -> bool {
        match self {
            CostOrdering::Minimize => candidate < best,
            CostOrdering::Maximize => candidate > best,
        }
    }
}

/// How a [Mediator] selects the actors that handle an action.
pub enum MediationStrategy<T, O> {
    /// Runs the first actor (in subscription order) that passes the test.
    FirstApplicable,
    /// Runs all actors that pass the test concurrently and merges their outputs, in
    /// subscription order, with `merge`.
    CombineAll {
        /// Merges the outputs.
        merge: MergeFn<O>,
    },
    /// Runs the actor whose test result has the best cost. Ties are broken by subscription
    /// order.
    BestByCost {
        /// Extracts the cost from a test result.
        cost: CostFn<T>,
        /// Whether lower or higher costs are better.
        ordering: CostOrdering,
    },
}

impl<T, O> MediationStrategy<T, O> {
    /// Creates a [MediationStrategy::CombineAll].
    pub fn combine_all(
        merge: impl Fn(Vec<O>) -> Result<O, ActorError> + Send + Sync + 'static,
    ) -> Self {
        Self::CombineAll {
            merge: Arc::new(merge),
        }
    }

    /// Creates a [MediationStrategy::BestByCost] that selects the lowest cost.
    pub fn best_by_cost(cost: impl Fn(&T) -> Option<f64> + Send + Sync + 'static) -> Self {
        Self::BestByCost {
            cost: Arc::new(cost),
            ordering: CostOrdering::Minimize,
        }
    }

    /// Creates a [MediationStrategy::BestByCost] that selects the highest value.
    pub fn best_by_value(cost: impl Fn(&T) -> Option<f64> + Send + Sync + 'static) -> Self {
        Self::BestByCost {
            cost: Arc::new(cost),
            ordering: CostOrdering::Maximize,
        }
    }
}

impl<T, O> Clone for MediationStrategy<T, O> {
    fn clone(&self) -> Self {
        match self {
            Self::FirstApplicable => Self::FirstApplicable,
            Self::CombineAll { merge } => Self::CombineAll {
                merge: Arc::clone(merge),
            },
            Self::BestByCost { cost, ordering } => Self::BestByCost {
                cost: Arc::clone(cost),
                ordering: *ordering,
            },
        }
    }
}

impl<T, O> Debug for MediationStrategy<T, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstApplicable => f.write_str("FirstApplicable"),
            Self::CombineAll { .. } => f.write_str("CombineAll"),
            Self::BestByCost { ordering, .. } => f
                .debug_struct("BestByCost")
                .field("ordering", ordering)
                .finish_non_exhaustive(),
        }
    }
}

/// Selects and runs the actors of a [Bus] that handle an action.
///
/// ```
/// # tokio_test::block_on(async {
/// use async_trait::async_trait;
/// use rdf_weave_actor::{Action, Actor, Bus, MediationStrategy, Mediator, TestResult};
/// use rdf_weave_common::{ActionContext, ActorError, Inapplicable};
/// use std::sync::Arc;
///
/// #[derive(Clone, Debug, Default)]
/// struct Square {
///     value: u64,
///     context: ActionContext,
/// }
///
/// impl Action for Square {
///     fn context(&self) -> &ActionContext {
///         &self.context
///     }
/// }
///
/// #[derive(Debug)]
/// struct SmallSquare;
///
/// #[async_trait]
/// impl Actor<Square, (), u64> for SmallSquare {
///     fn name(&self) -> &str {
///         "actor-small-square"
///     }
///
///     async fn test(&self, action: &Square) -> TestResult<()> {
///         if action.value > 1000 {
///             return Inapplicable::reject("value is too large");
///         }
///         Ok(())
///     }
///
///     async fn run(&self, action: Square) -> Result<u64, ActorError> {
///         Ok(action.value * action.value)
///     }
/// }
///
/// let mut bus = Bus::<Square, (), u64>::new("bus-square");
/// bus.subscribe(Arc::new(SmallSquare));
///
/// let strategy = MediationStrategy::FirstApplicable;
/// let mediator = Mediator::new("mediator-square", Arc::new(bus), strategy);
/// let square = Square { value: 12, ..Square::default() };
/// assert_eq!(mediator.mediate(square).await.unwrap(), 144);
///
/// let too_large = Square { value: 2000, ..Square::default() };
/// assert!(mediator.mediate(too_large).await.is_err());
/// # })
/// ```
pub struct Mediator<A, T, O> {
    name: String,
    bus: Arc<Bus<A, T, O>>,
    strategy: MediationStrategy<T, O>,
}

impl<A, T, O> Mediator<A, T, O>
where
    A: Action,
    T: Send + 'static,
    O: Send + 'static,
{
    /// Creates a new [Mediator].
    pub fn new(
        name: impl Into<String>,
        bus: Arc<Bus<A, T, O>>,
        strategy: MediationStrategy<T, O>,
    ) -> Self {
        Self {
            name: name.into(),
            bus,
            strategy,
        }
    }

    /// Returns the name of this mediator.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the bus of this mediator.
    pub fn bus(&self) -> &Arc<Bus<A, T, O>> {
        &self.bus
    }

    /// Returns the strategy of this mediator.
    pub fn strategy(&self) -> &MediationStrategy<T, O> {
        &self.strategy
    }

    /// Selects the actor(s) for `action` and runs them.
    ///
    /// Returns [MediationError::NoApplicableActor] if no actor passes the test. An error of a
    /// selected actor is returned as is; no other actor is tried instead.
    pub async fn mediate(&self, action: A) -> Result<O, MediationError> {
        let passed = self.passed_actors(&action).await?;

        if let MediationStrategy::CombineAll { merge } = &self.strategy {
            return self.run_all(passed, action, merge).await;
        }

        let actor = self.select(passed)?;
        tracing::debug!(mediator = %self.name, actor = actor.name(), "Selected actor");
        let observed = self.bus.has_observers().then(|| action.clone());
        let output = actor.run(action).await?;
        if let Some(action) = observed {
            self.bus.on_run(actor.name(), &action, &output);
        }
        Ok(output)
    }

    /// Selects the actor for `action` without running it.
    ///
    /// A [MediationStrategy::CombineAll] mediator returns the first actor that passes the test.
    pub async fn mediate_actor(&self, action: &A) -> Result<ActorRef<A, T, O>, MediationError> {
        let passed = self.passed_actors(action).await?;
        self.select(passed)
    }

    async fn passed_actors(
        &self,
        action: &A,
    ) -> Result<Vec<(ActorRef<A, T, O>, T)>, MediationError> {
        let outcomes = self.bus.publish(action).await;

        let mut passed = Vec::new();
        let mut reasons = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(result) => passed.push((outcome.actor, result)),
                Err(reason) => {
                    tracing::trace!(
                        mediator = %self.name,
                        actor = outcome.actor.name(),
                        reason = %reason,
                        "Actor rejected action"
                    );
                    reasons.push(RejectedActor {
                        actor: outcome.actor.name().to_owned(),
                        reason,
                    });
                }
            }
        }

        if passed.is_empty() {
            return Err(MediationError::NoApplicableActor {
                mediator: self.name.clone(),
                bus: self.bus.name().to_owned(),
                reasons,
            });
        }
        Ok(passed)
    }

    fn select(
        &self,
        passed: Vec<(ActorRef<A, T, O>, T)>,
    ) -> Result<ActorRef<A, T, O>, MediationError> {
        let MediationStrategy::BestByCost { cost, ordering } = &self.strategy else {
            return passed
                .into_iter()
                .next()
                .map(|(actor, _)| actor)
                .ok_or_else(|| self.no_applicable_actor());
        };

        let mut best: Option<(ActorRef<A, T, O>, f64)> = None;
        for (actor, result) in passed {
            let Some(candidate) = cost(&result) else {
                return Err(MediationError::MissingCost {
                    mediator: self.name.clone(),
                    actor: actor.name().to_owned(),
                });
            };
            if candidate.is_nan() {
                return Err(MediationError::InvalidCost {
                    mediator: self.name.clone(),
                    actor: actor.name().to_owned(),
                    cost: candidate,
                });
            }
            tracing::trace!(mediator = %self.name, actor = actor.name(), cost = candidate);

            let is_better = match &best {
                None => true,
                Some((_, best_cost)) => ordering.is_better(candidate, *best_cost),
            };
            if is_better {
                best = Some((actor, candidate));
            }
        }

        best.map(|(actor, _)| actor)
            .ok_or_else(|| self.no_applicable_actor())
    }

    async fn run_all(
        &self,
        passed: Vec<(ActorRef<A, T, O>, T)>,
        action: A,
        merge: &MergeFn<O>,
    ) -> Result<O, MediationError> {
        tracing::debug!(
            mediator = %self.name,
            actors = passed.len(),
            "Running all applicable actors"
        );

        let runs = passed.into_iter().map(|(actor, _)| {
            let action = action.clone();
            async move {
                let observed = self.bus.has_observers().then(|| action.clone());
                let output = actor.run(action).await?;
                if let Some(action) = observed {
                    self.bus.on_run(actor.name(), &action, &output);
                }
                Ok::<_, ActorError>(output)
            }
        });
        let outputs = try_join_all(runs).await?;
        merge(outputs).map_err(MediationError::from)
    }

    fn no_applicable_actor(&self) -> MediationError {
        MediationError::NoApplicableActor {
            mediator: self.name.clone(),
            bus: self.bus.name().to_owned(),
            reasons: Vec::new(),
        }
    }
}

impl<A, O> Mediator<A, JoinCoefficients, O>
where
    A: Action,
    O: Send + 'static,
{
    /// Creates a best-by-cost mediator that ranks join actors by their weighted
    /// [JoinCoefficients].
    pub fn join_coefficients(
        name: impl Into<String>,
        bus: Arc<Bus<A, JoinCoefficients, O>>,
        weights: JoinCoefficientWeights,
    ) -> Self {
        let cost = move |coefficients: &JoinCoefficients| Some(weights.cost(coefficients));
        Self::new(name, bus, MediationStrategy::best_by_cost(cost))
    }
}

impl<A, T, O> Debug for Mediator<A, T, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("name", &self.name)
            .field("bus", &self.bus)
            .field("strategy", &self.strategy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{TestAction, TestActor};
    use crate::ActionObserver;
    use insta::assert_snapshot;
    use std::sync::Mutex;

    type TestMediator = Mediator<TestAction, u32, String>;

    fn mediator(
        actors: Vec<Arc<TestActor>>,
        strategy: MediationStrategy<u32, String>,
    ) -> TestMediator {
        let mut bus = Bus::<TestAction, u32, String>::new("bus-test");
        for actor in actors {
            bus.subscribe(actor);
        }
        Mediator::new("mediator-test", Arc::new(bus), strategy)
    }

    fn by_cost() -> MediationStrategy<u32, String> {
        MediationStrategy::best_by_cost(|cost: &u32| Some(f64::from(*cost)))
    }

    fn concat() -> MediationStrategy<u32, String> {
        MediationStrategy::combine_all(|outputs: Vec<String>| Ok(outputs.join(",")))
    }

    #[tokio::test]
    async fn first_applicable_runs_first_passing_actor() {
        let a = TestActor::rejecting("a", "not applicable");
        let b = TestActor::passing("b", 1);
        let c = TestActor::passing("c", 1);
        let mediator = mediator(
            vec![a.clone(), b.clone(), c.clone()],
            MediationStrategy::FirstApplicable,
        );

        for _ in 0..10 {
            let output = mediator.mediate(TestAction::new(1)).await.unwrap();
            assert_eq!(output, "b(1)");
        }
        assert_eq!((a.runs(), b.runs(), c.runs()), (0, 10, 0));
    }

    #[tokio::test]
    async fn best_by_cost_selects_minimum() {
        let mediator = mediator(
            vec![
                TestActor::passing("a", 5),
                TestActor::passing("b", 2),
                TestActor::passing("c", 3),
            ],
            by_cost(),
        );

        let output = mediator.mediate(TestAction::new(1)).await.unwrap();
        assert_eq!(output, "b(1)");
    }

    #[tokio::test]
    async fn best_by_cost_breaks_ties_by_subscription_order() {
        let mediator = mediator(
            vec![
                TestActor::passing("a", 5),
                TestActor::passing("b", 2),
                TestActor::passing("c", 2),
            ],
            by_cost(),
        );

        for _ in 0..10 {
            let actor = mediator.mediate_actor(&TestAction::new(1)).await.unwrap();
            assert_eq!(actor.name(), "b");
        }
    }

    #[tokio::test]
    async fn best_by_value_selects_maximum() {
        let mediator = mediator(
            vec![TestActor::passing("a", 5), TestActor::passing("b", 7)],
            MediationStrategy::best_by_value(|value: &u32| Some(f64::from(*value))),
        );

        let actor = mediator.mediate_actor(&TestAction::new(1)).await.unwrap();
        assert_eq!(actor.name(), "b");
    }

    #[tokio::test]
    async fn best_by_cost_requires_cost() {
        let mediator = mediator(
            vec![TestActor::passing("a", 5), TestActor::passing("b", 0)],
            MediationStrategy::best_by_cost(|cost: &u32| (*cost > 0).then(|| f64::from(*cost))),
        );

        let error = mediator.mediate(TestAction::new(1)).await.unwrap_err();
        assert_snapshot!(error, @"Actor b did not provide a cost required by mediator mediator-test");
    }

    #[tokio::test]
    async fn best_by_cost_rejects_nan_cost() {
        let mediator = mediator(
            vec![TestActor::passing("a", 0), TestActor::passing("b", 1)],
            MediationStrategy::best_by_cost(|cost: &u32| {
                Some(if *cost == 0 { f64::NAN } else { f64::from(*cost) })
            }),
        );

        let error = mediator.mediate(TestAction::new(1)).await.unwrap_err();
        assert_snapshot!(error, @"Actor a provided the invalid cost NaN to mediator mediator-test");
    }

    #[tokio::test]
    async fn combine_all_merges_outputs_in_subscription_order() {
        let mediator = mediator(
            vec![
                TestActor::passing("a", 1),
                TestActor::rejecting("b", "not applicable"),
                TestActor::passing("c", 1),
                TestActor::passing("d", 1),
            ],
            concat(),
        );

        let output = mediator.mediate(TestAction::new(7)).await.unwrap();
        assert_eq!(output, "a(7),c(7),d(7)");
    }

    #[tokio::test]
    async fn combine_all_fails_if_one_actor_fails() {
        let mediator = mediator(
            vec![
                TestActor::passing("a", 1),
                TestActor::failing("b", 1),
                TestActor::passing("c", 1),
            ],
            concat(),
        );

        let error = mediator.mediate(TestAction::new(7)).await.unwrap_err();
        assert_snapshot!(error, @"Invalid action: b failed");
    }

    #[tokio::test]
    async fn no_applicable_actor_lists_reasons() {
        let mediator = mediator(
            vec![
                TestActor::rejecting("a", "requires a"),
                TestActor::rejecting("b", "requires b"),
            ],
            MediationStrategy::FirstApplicable,
        );

        let error = mediator.mediate(TestAction::new(1)).await.unwrap_err();
        assert_snapshot!(error, @r"
        No actors are able to reply to a message in mediator mediator-test (bus bus-test). Rejections:
            a: requires a
            b: requires b
        ");
    }

    #[tokio::test]
    async fn empty_bus_has_no_applicable_actor() {
        for strategy in [MediationStrategy::FirstApplicable, by_cost(), concat()] {
            let mediator = mediator(Vec::new(), strategy);
            let error = mediator.mediate(TestAction::new(1)).await.unwrap_err();
            assert!(matches!(
                error,
                MediationError::NoApplicableActor { reasons, .. } if reasons.is_empty()
            ));
        }
    }

    #[tokio::test]
    async fn run_failure_is_not_retried() {
        let a = TestActor::failing("a", 1);
        let b = TestActor::passing("b", 2);
        let mediator = mediator(vec![a.clone(), b.clone()], by_cost());

        let error = mediator.mediate(TestAction::new(1)).await.unwrap_err();
        assert!(matches!(error, MediationError::Actor(ActorError::InvalidAction(_))));
        assert_eq!((a.runs(), b.runs()), (1, 0));
    }

    #[tokio::test]
    async fn join_coefficients_mediator_uses_weights() {
        #[derive(Debug)]
        struct JoinActor {
            name: &'static str,
            coefficients: JoinCoefficients,
        }

        #[async_trait::async_trait]
        impl crate::Actor<TestAction, JoinCoefficients, String> for JoinActor {
            fn name(&self) -> &str {
                self.name
            }

            async fn test(&self, _action: &TestAction) -> crate::TestResult<JoinCoefficients> {
                Ok(self.coefficients)
            }

            async fn run(&self, _action: TestAction) -> Result<String, ActorError> {
                Ok(self.name.to_owned())
            }
        }

        let mut bus = Bus::<TestAction, JoinCoefficients, String>::new("bus-join");
        bus.subscribe(Arc::new(JoinActor {
            name: "many-iterations",
            coefficients: JoinCoefficients {
                iterations: 100.0,
                ..JoinCoefficients::default()
            },
        }));
        bus.subscribe(Arc::new(JoinActor {
            name: "blocking",
            coefficients: JoinCoefficients {
                iterations: 20.0,
                blocking_items: 10.0,
                ..JoinCoefficients::default()
            },
        }));
        let bus = Arc::new(bus);

        let mediator =
            Mediator::join_coefficients("mediator-join", Arc::clone(&bus), Default::default());
        assert_eq!(mediator.mediate(TestAction::new(1)).await.unwrap(), "many-iterations");

        let cheap_time = JoinCoefficientWeights::default().with_time_weight(1.0);
        let mediator = Mediator::join_coefficients("mediator-join", bus, cheap_time);
        assert_eq!(mediator.mediate(TestAction::new(1)).await.unwrap(), "blocking");
    }

    #[derive(Debug, Default)]
    struct CountingObserver {
        runs: Mutex<Vec<String>>,
    }

    impl ActionObserver<TestAction, String> for CountingObserver {
        fn name(&self) -> &str {
            "observer-counting"
        }

        fn on_run(&self, actor: &str, _action: &TestAction, _output: &String) {
            self.runs.lock().unwrap().push(actor.to_owned());
        }
    }

    #[tokio::test]
    async fn observers_see_every_run() {
        let observer = Arc::new(CountingObserver::default());
        let mut bus = Bus::<TestAction, u32, String>::new("bus-test");
        bus.subscribe(TestActor::passing("a", 1));
        bus.subscribe(TestActor::passing("b", 1));
        bus.subscribe_observer(observer.clone());
        let bus = Arc::new(bus);

        let first = Mediator::new("first", Arc::clone(&bus), MediationStrategy::FirstApplicable);
        first.mediate(TestAction::new(1)).await.unwrap();
        let all = Mediator::new("all", bus, concat());
        all.mediate(TestAction::new(1)).await.unwrap();

        assert_eq!(*observer.runs.lock().unwrap(), vec!["a", "a", "b"]);
    }
}
