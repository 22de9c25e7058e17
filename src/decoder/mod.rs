//! The `decoder` module turns a device-state notification into the channel
//! updates the device framework understands.
//!
//! `channel` defines what an update looks like; `state` holds the decoding
//! rules (level/state coupling, bulb-mode dispatch, colour scaling).

pub mod channel;
pub mod state;

pub use channel::{ChannelKind, ChannelUpdate, ChannelValue, Delivery, Hsb, channel_prefix};
pub use state::StateDecoder;
