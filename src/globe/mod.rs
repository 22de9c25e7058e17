//! The `globe` module encodes commands aimed at a single globe into hub
//! payloads and hands them to the bridge's outbound queue.

pub mod handler;
pub mod payload;

pub use handler::{Globe, GlobeCommand};
