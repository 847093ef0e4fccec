//! Document port for the in-page automation engine
//!
//! This crate describes the host document APIs the engine consumes:
//! - Structural and path element queries
//! - Element geometry and the offset-parent chain
//! - Computed style and attribute access
//! - Viewport scrolling and one-shot intersection observation
//!
//! `MemoryDocument` implements the port over an owned element tree and is
//! what the CLI host and the test suites run against.

pub mod errors;
pub mod fixture;
pub mod memory;
pub mod model;
mod path;
pub mod ports;
mod selector;

pub use errors::*;
pub use fixture::*;
pub use memory::*;
pub use model::*;
pub use ports::*;
