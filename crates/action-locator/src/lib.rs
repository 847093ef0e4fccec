//! Element resolution for the in-page engine
//!
//! Selector strings are classified by prefix and routed to one of two
//! strategies:
//! - Path-query (`/...` or `(/...`) evaluated as a location path
//! - Structural-query (anything else) evaluated as a selector list
//!
//! Zero matches is a valid outcome, distinct from a malformed selector.

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
