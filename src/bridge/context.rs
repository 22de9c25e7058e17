use std::sync::Arc;

use tokio::sync::watch;

use crate::bridge::sink::ChannelSink;
use crate::config::{GlobeSettings, Settings};
use crate::queue::OutboundQueue;
use crate::transport::LinkStatus;

/// Everything a globe needs from its bridge.
///
/// One context exists per bridge and is shared by every globe attached to it.
pub struct BridgeContext {
    settings: Settings,
    status: watch::Receiver<LinkStatus>,
    outbound: OutboundQueue,
    sink: Arc<dyn ChannelSink>,
}

impl BridgeContext {
    pub fn new(
        settings: Settings,
        status: watch::Receiver<LinkStatus>,
        outbound: OutboundQueue,
        sink: Arc<dyn ChannelSink>,
    ) -> Self {
        Self {
            settings,
            status,
            outbound,
            sink,
        }
    }

    pub fn bridge_id(&self) -> &str {
        &self.settings.bridge.id
    }

    pub fn globe_settings(&self) -> &GlobeSettings {
        &self.settings.globe
    }

    pub fn status(&self) -> LinkStatus {
        self.status.borrow().clone()
    }

    pub fn is_online(&self) -> bool {
        self.status.borrow().is_online()
    }

    pub fn outbound(&self) -> &OutboundQueue {
        &self.outbound
    }

    pub fn sink(&self) -> &dyn ChannelSink {
        self.sink.as_ref()
    }

    /// `host:port` of the configured broker, for log lines.
    pub fn broker_address(&self) -> String {
        format!("{}:{}", self.settings.mqtt.host, self.settings.mqtt.port)
    }
}
