//! Page primitives for the in-page engine
//!
//! This crate provides the document-level building blocks conditions rely on:
//! - Cumulative offset along the offset-parent chain
//! - Vertical centering of an element in the viewport
//! - One-shot intersection sampling under a bounded wait
//! - The "center then sample" visibility prober

pub mod errors;
mod primitives;
pub mod prober;
pub mod types;

pub use errors::*;
pub use primitives::*;
pub use prober::*;
pub use types::*;
