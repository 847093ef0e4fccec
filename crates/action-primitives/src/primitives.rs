//! Primitive document operations
//!
//! 1. scroll - offset accumulation and viewport centering
//! 2. wait - bounded one-shot intersection sampling

mod scroll;
mod wait;

pub use scroll::*;
pub use wait::*;
