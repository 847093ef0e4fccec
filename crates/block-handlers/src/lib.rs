pub mod builtins;
pub mod errors;
pub mod kind;
pub mod model;
pub mod registry;

pub use builtins::{AttributeValueHandler, ElementExistsHandler, GetTextHandler, ScrollElementHandler};
pub use errors::BlockError;
pub use kind::{to_camel_case, BlockKind};
pub use model::{BlockContext, BlockRequest};
pub use registry::{BlockHandler, HandlerRegistry};
