//! Element conditions for the in-page engine
//!
//! This crate answers the four element condition families:
//! - `text`: rendered text of the element
//! - `visible`: fully in view after centering (bounded probe)
//! - `invisible`: hidden by computed style
//! - `attribute`: attribute value, distinguishing empty from absent
//!
//! Condition types outside the `element` prefix are not evaluated and yield
//! `null`.

pub mod conditions;
pub mod errors;
pub mod evaluator;
pub mod types;

pub use conditions::*;
pub use errors::*;
pub use evaluator::*;
pub use types::*;
