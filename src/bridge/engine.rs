//! Bridge lifecycle.
//!
//! A running bridge owns three long-lived lanes:
//! - the event pump, turning transport events into status changes and
//!   inbound state messages,
//! - the connection poller, (re)subscribing to state topics while online,
//! - the inbound drain, owned by `InboundQueue`.
//!
//! The outbound ticker is started on demand by `OutboundQueue`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::bridge::context::BridgeContext;
use crate::bridge::sink::ChannelSink;
use crate::codec::Address;
use crate::config::Settings;
use crate::decoder::StateDecoder;
use crate::globe::Globe;
use crate::queue::{InboundQueue, OutboundQueue, StateDispatcher};
use crate::transport::{LinkStatus, Transport, TransportEvent};
use crate::utils::error::TransportError;

pub const CONNECTING_DETAIL: &str = "Connecting to the MQTT broker.";
pub const POLL_OFFLINE_DETAIL: &str =
    "Could not connect to the MQTT broker, check the broker address and credentials.";
pub const DISCONNECTED_DETAIL: &str = "Currently disconnected from the MQTT broker.";

/// A running bridge between one MQTT hub and a channel sink.
pub struct Bridge {
    context: Arc<BridgeContext>,
    inbound: Arc<InboundQueue>,
    transport: Arc<dyn Transport>,
    status: Arc<watch::Sender<LinkStatus>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Bridge {
    /// Wires the queues to the transport and spawns the bridge lanes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        settings: Settings,
        transport: Arc<dyn Transport>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
        sink: Arc<dyn ChannelSink>,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(LinkStatus::offline(CONNECTING_DETAIL));
        let status = Arc::new(status_tx);

        let outbound = OutboundQueue::new(
            transport.clone(),
            settings.pacing.clone(),
            status_rx.clone(),
        );
        let dispatcher = StateDispatcher::new(
            StateDecoder::new(settings.bridge.id.clone(), settings.globe.clone()),
            sink.clone(),
        );
        let inbound = Arc::new(InboundQueue::new(
            dispatcher,
            status_rx.clone(),
            Duration::from_millis(settings.pacing.inbound_drain_ms),
        ));

        let filter = settings.mqtt.state_filter.clone();
        let poll_every = Duration::from_secs(settings.pacing.connection_poll_secs.max(1));
        let context = Arc::new(BridgeContext::new(settings, status_rx, outbound, sink));
        info!(
            "Starting bridge {} for broker {}",
            context.bridge_id(),
            context.broker_address()
        );

        let resubscribe = Arc::new(AtomicBool::new(false));
        let pump = tokio::spawn(run_event_pump(
            events,
            status.clone(),
            inbound.clone(),
            resubscribe.clone(),
        ));
        let poller = tokio::spawn(run_poller(
            transport.clone(),
            status.clone(),
            resubscribe,
            filter,
            poll_every,
        ));

        Self {
            context,
            inbound,
            transport,
            status,
            tasks: vec![pump, poller],
        }
    }

    pub fn context(&self) -> Arc<BridgeContext> {
        self.context.clone()
    }

    /// Attaches a globe to this bridge.
    pub fn globe(&self, address: Address) -> Globe {
        Globe::new(address, self.context.clone())
    }

    pub fn status(&self) -> watch::Receiver<LinkStatus> {
        self.status.subscribe()
    }

    /// Cancels every lane and waits for each to stop, then disconnects the
    /// transport. No tick runs against a released connection.
    pub async fn shutdown(self) -> Result<(), TransportError> {
        let mut lanes = self.tasks;
        for task in &lanes {
            task.abort();
        }
        lanes.extend(self.context.outbound().shutdown());
        lanes.extend(self.inbound.shutdown());

        for lane in lanes {
            if let Err(e) = lane.await {
                if !e.is_cancelled() {
                    error!("Bridge task failed during shutdown: {}", e);
                }
            }
        }
        self.status.send_replace(LinkStatus::offline(DISCONNECTED_DETAIL));

        info!("Disconnecting bridge {}", self.context.bridge_id());
        self.transport.disconnect().await
    }
}

async fn run_event_pump(
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    status: Arc<watch::Sender<LinkStatus>>,
    inbound: Arc<InboundQueue>,
    resubscribe: Arc<AtomicBool>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Connected => {
                info!("Connected to the MQTT broker");
                resubscribe.store(true, Ordering::SeqCst);
                status.send_replace(LinkStatus::Online);
            }
            TransportEvent::ConnectionLost(cause) => {
                error!("MQTT broker connection lost: {}", cause);
                status.send_replace(LinkStatus::offline(format!(
                    "MQTT broker connection lost: {cause}"
                )));
            }
            TransportEvent::Message { topic, payload } => {
                inbound.on_message_arrived(topic, payload);
            }
        }
    }
    debug!("Transport event stream closed");
}

/// Subscribes to state topics whenever a (re)connect left a subscription
/// pending, and reports a failed connection on every poll while offline.
async fn run_poller(
    transport: Arc<dyn Transport>,
    status: Arc<watch::Sender<LinkStatus>>,
    resubscribe: Arc<AtomicBool>,
    filter: String,
    every: Duration,
) {
    let mut changes = status.subscribe();
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    loop {
        let polled = tokio::select! {
            _ = ticker.tick() => true,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                false
            }
        };

        let online = changes.borrow_and_update().is_online();
        if online {
            if resubscribe.swap(false, Ordering::SeqCst) {
                match transport.subscribe(&filter).await {
                    Ok(()) => info!("Subscribed to {}", filter),
                    Err(e) => {
                        error!("Could not subscribe to {}: {}", filter, e);
                        resubscribe.store(true, Ordering::SeqCst);
                    }
                }
            }
        } else if polled {
            status.send_if_modified(|current| match current {
                LinkStatus::Offline { detail } if detail == POLL_OFFLINE_DETAIL => false,
                _ => {
                    *current = LinkStatus::offline(POLL_OFFLINE_DETAIL);
                    true
                }
            });
        }
    }
}
