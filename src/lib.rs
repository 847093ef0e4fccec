//! SoulBrowser content host
//!
//! Wires a document, the block handler registry and the message bridge
//! into one installable unit, and serves it over newline-delimited JSON.

pub mod config;
pub mod errors;
pub mod host;
pub mod transport;

pub use config::ContentConfig;
pub use errors::ContentError;
pub use host::ContentHost;
pub use transport::serve_lines;
