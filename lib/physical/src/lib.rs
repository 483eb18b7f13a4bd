#![doc(test(attr(deny(warnings))))]

//! Contains physical operators for [RDF Weave](../../rdf-weave) and the actors that select
//! them.

pub mod join;
