use rdf_weave_actor::Action;
use rdf_weave_common::ActionContext;
use rdf_weave_model::{Bindings, BindingsMetadata};
use rdf_weave_stream::{stream_from_iter, CloneableStream};

/// A bindings stream together with its metadata.
#[derive(Clone, Debug)]
pub struct BindingsOutput {
    /// The bindings.
    pub stream: CloneableStream<Bindings>,
    /// The metadata of [Self::stream].
    pub metadata: BindingsMetadata,
}

impl BindingsOutput {
    /// Creates a new [BindingsOutput].
    pub fn new(stream: CloneableStream<Bindings>, metadata: BindingsMetadata) -> Self {
        Self { stream, metadata }
    }

    /// Creates a [BindingsOutput] from materialized bindings.
    pub fn from_bindings(bindings: Vec<Bindings>, metadata: BindingsMetadata) -> Self {
        Self::new(CloneableStream::new(stream_from_iter(bindings)), metadata)
    }
}

/// An operand of an [ActionJoin].
#[derive(Clone, Debug)]
pub struct JoinEntry {
    /// The bindings to join.
    pub output: BindingsOutput,
}

impl JoinEntry {
    /// Creates a new [JoinEntry].
    pub fn new(output: BindingsOutput) -> Self {
        Self { output }
    }
}

/// Requests the inner join of all entries.
#[derive(Clone, Debug)]
pub struct ActionJoin {
    /// The operands of the join.
    pub entries: Vec<JoinEntry>,
    context: ActionContext,
}

impl ActionJoin {
    /// Creates a new [ActionJoin].
    pub fn new(entries: Vec<JoinEntry>, context: ActionContext) -> Self {
        Self { entries, context }
    }
}

impl Action for ActionJoin {
    fn context(&self) -> &ActionContext {
        &self.context
    }
}
