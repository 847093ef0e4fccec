//! Loop element tagging
//!
//! A loop body runs as independent later requests that cannot carry live
//! element handles. Before the loop starts, every element it will visit is
//! stamped with a marker attribute scoped by a fresh run identifier, and the
//! controller receives one lookup selector per element.

pub mod errors;
pub mod tagger;
pub mod types;

pub use errors::FlowError;
pub use tagger::{exceeds_loop_bound, LoopTagger, LOOP_MARKER_ATTR};
pub use types::{LoopRequest, LoopTags};
