//! The `error` module defines the error types used within `milight-bridge`.
//!
//! None of these errors terminate the process. Each layer degrades to
//! "skip and continue" or "mark offline and retry"; the types exist so the
//! layers can report *why* something was skipped.

use thiserror::Error;

/// A topic string that does not follow `milight/{states|commands}/{remote}/{type}/{group}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("topic '{0}' does not start with a milight prefix")]
    UnknownPrefix(String),

    #[error("topic '{0}' must have exactly three segments after the prefix")]
    SegmentCount(String),

    #[error("unknown device type '{0}'")]
    UnknownDeviceType(String),

    #[error("group id '{0}' is not in 0..=8")]
    InvalidGroup(String),
}

/// Rejections raised by the outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("invalid argument: topic '{topic}' / payload '{payload}'")]
    InvalidArgument { topic: String, payload: String },
}

/// Failures reported by the pub/sub transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,

    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("subscribe to '{filter}' failed: {reason}")]
    Subscribe { filter: String, reason: String },

    #[error("disconnect failed: {0}")]
    Disconnect(String),
}

/// Top-level error returned by the bridge and the binary.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
