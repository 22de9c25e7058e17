//! # Milight Bridge
//!
//! `milight_bridge` connects Milight globes, reached through an MQTT hub, to a
//! device framework. Commands are encoded, deduplicated and paced on their
//! way to the broker; state notifications are decoded into channel updates
//! on their way back.
//!
//! ## Core Modules
//!
//! - `codec`: topic strings and the lightweight payload field extractor.
//! - `decoder`: turns a state payload into ordered channel updates.
//! - `queue`: the paced outbound command queue and the inbound state queue.
//! - `globe`: encodes channel commands for one globe into hub payloads.
//! - `bridge`: lifecycle, link status and the sink that receives updates.
//! - `transport`: the broker seam and its MQTT implementation.
//! - `config`: loading settings from files and the environment.
//! - `utils`: shared errors and logging setup.

pub mod bridge;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod globe;
pub mod queue;
pub mod transport;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
