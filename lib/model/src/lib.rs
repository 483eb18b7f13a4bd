#![doc(test(attr(deny(warnings))))]

mod bindings;
mod metadata;

pub use bindings::Bindings;
pub use metadata::{BindingsMetadata, Cardinality, CardinalityKind};

// Re-export some oxrdf types.
pub use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, Literal, LiteralRef, NamedNode,
    NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, Subject, SubjectRef,
    Term, TermRef, Triple, TripleRef, Variable, VariableNameParseError, VariableRef,
};
