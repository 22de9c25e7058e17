//! The `codec` module holds the two stateless translators at the bottom of
//! the pipeline:
//!
//! - `extract`: pulls a bounded value out of a near-JSON payload without a parser.
//! - `topic`: maps `(remote code, device type, group)` to and from topic strings,
//!   including the group-0 broadcast expansion.

pub mod extract;
pub mod topic;

pub use extract::extract;
pub use topic::{Address, DeviceType, TopicKind, broadcast_targets, build, parse};

#[cfg(test)]
mod tests;
