/// Notifications a transport delivers to the bridge from its own task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    ConnectionLost(String),
    Message { topic: String, payload: String },
}

/// Reachability of the broker as seen by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Online,
    Offline { detail: String },
}

impl LinkStatus {
    pub fn offline(detail: impl Into<String>) -> Self {
        LinkStatus::Offline {
            detail: detail.into(),
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, LinkStatus::Online)
    }
}
