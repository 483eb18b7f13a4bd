#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod kernel;

pub use kernel::{Kernel, KernelOptions};

pub mod model {
    pub use rdf_weave_model::*;
}

pub mod common {
    pub use rdf_weave_common::*;
}

pub mod actor {
    pub use rdf_weave_actor::*;
}

pub mod stream {
    pub use rdf_weave_stream::*;
}

pub mod physical {
    pub use rdf_weave_physical::*;
}

pub mod traversal {
    pub use rdf_weave_traversal::*;
}
