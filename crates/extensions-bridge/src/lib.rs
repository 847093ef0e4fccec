//! Content-side message bridge.
//!
//! Inbound controller messages are classified into commands and routed to
//! the condition evaluator, the loop tagger, a registered block handler
//! (under an in-progress mark) or one of the direct queries. Every request
//! yields exactly one [`Outcome`]; only unrecognized types stay unanswered.

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod guard;
pub mod listener;
pub mod request;

pub use config::BridgeConfig;
pub use dispatcher::{CommandDispatcher, Dispatcher, Outcome};
pub use errors::BridgeError;
pub use events::{OutboundBus, OutboundMessage};
pub use guard::InjectionGuard;
pub use listener::{ChannelListener, ContentClient, Envelope, Reply, Responder};
pub use request::{Command, Request};
