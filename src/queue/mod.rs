//! The `queue` module buffers traffic between the bridge and the broker.
//!
//! - `outbound`: deduplicating, paced FIFO of device commands.
//! - `inbound`: FIFO of state notifications, decoded and fanned out per globe.

pub mod inbound;
pub mod outbound;

pub use inbound::{InboundQueue, StateDispatcher, StateMessage};
pub use outbound::{Command, OutboundQueue, POWER_FAIL_SENTINEL, PacingMode};
