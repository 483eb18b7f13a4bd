use crate::{Action, Actor, TestResult};
use async_trait::async_trait;
use rdf_weave_common::{ActionContext, ActorError, Inapplicable};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct TestAction {
    pub value: u32,
    context: ActionContext,
}

impl TestAction {
    pub fn new(value: u32) -> Self {
        Self {
            value,
            context: ActionContext::new(),
        }
    }
}

impl Action for TestAction {
    fn context(&self) -> &ActionContext {
        &self.context
    }
}

/// An actor with a fixed test result that returns `<name>(<value>)` when run.
#[derive(Debug)]
pub struct TestActor {
    name: &'static str,
    test: TestResult<u32>,
    fail_run: bool,
    runs: AtomicUsize,
}

impl TestActor {
    pub fn passing(name: &'static str, cost: u32) -> Arc<Self> {
        Self::create(name, Ok(cost), false)
    }

    pub fn rejecting(name: &'static str, reason: &str) -> Arc<Self> {
        Self::create(name, Err(Inapplicable::new(reason)), false)
    }

    pub fn failing(name: &'static str, cost: u32) -> Arc<Self> {
        Self::create(name, Ok(cost), true)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    fn create(name: &'static str, test: TestResult<u32>, fail_run: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            test,
            fail_run,
            runs: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Actor<TestAction, u32, String> for TestActor {
    fn name(&self) -> &str {
        self.name
    }

    async fn test(&self, _action: &TestAction) -> TestResult<u32> {
        self.test.clone()
    }

    async fn run(&self, action: TestAction) -> Result<String, ActorError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail_run {
            return ActorError::invalid_action(format!("{} failed", self.name));
        }
        Ok(format!("{}({})", self.name, action.value))
    }
}
