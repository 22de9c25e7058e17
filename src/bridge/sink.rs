use tracing::info;

use crate::decoder::{ChannelUpdate, ChannelValue, Delivery};

/// Receives decoded channel updates.
///
/// Implementations are called from the inbound drain task and must not block.
pub trait ChannelSink: Send + Sync + 'static {
    /// Reflects a value on a channel without re-triggering listeners.
    fn update_state(&self, channel_id: &str, value: &ChannelValue);

    /// Posts a value as a command so whatever listens on the channel acts on it.
    fn post_command(&self, channel_id: &str, value: &ChannelValue);
}

/// Routes an update to the sink according to its delivery kind.
pub fn deliver(sink: &dyn ChannelSink, update: &ChannelUpdate) {
    let channel_id = update.channel_id();
    match update.delivery {
        Delivery::State => sink.update_state(&channel_id, &update.value),
        Delivery::Command => sink.post_command(&channel_id, &update.value),
    }
}

/// Sink used by the binary: every update becomes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl ChannelSink for LoggingSink {
    fn update_state(&self, channel_id: &str, value: &ChannelValue) {
        info!("state  {} = {}", channel_id, value);
    }

    fn post_command(&self, channel_id: &str, value: &ChannelValue) {
        info!("command {} = {}", channel_id, value);
    }
}
