//! MQTT transport on top of `rumqttc`.
//!
//! `rumqttc` reconnects on the next `poll()` after a connection error, so the
//! event loop task simply keeps polling and reports link transitions.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::MqttSettings;
use crate::transport::{Transport, TransportEvent};
use crate::utils::error::TransportError;

/// Requests the event loop may buffer before `publish` starts waiting.
const REQUEST_CAPACITY: usize = 64;

/// Pause between polls while the broker is unreachable.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// How long `disconnect` waits for the DISCONNECT packet to leave.
const DISCONNECT_GRACE: Duration = Duration::from_secs(3);

pub struct MqttTransport {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MqttTransport {
    /// Creates the client and spawns its event loop.
    ///
    /// Events (connect, connection loss, incoming publishes) arrive on the
    /// returned receiver. Must be called from within a tokio runtime.
    pub fn connect(
        settings: &MqttSettings,
        bridge_id: &str,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let client_id = format!(
            "{}-{}-{}",
            settings.client_id_prefix,
            bridge_id,
            &Uuid::new_v4().simple().to_string()[..8]
        );

        let mut options = MqttOptions::new(client_id.clone(), settings.host.clone(), settings.port);
        options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));
        options.set_clean_session(settings.clean_session);
        options.set_inflight(settings.max_inflight);
        if let Some(username) = &settings.username {
            options.set_credentials(
                username.clone(),
                settings.password.clone().unwrap_or_default(),
            );
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        info!(
            "Connecting to MQTT broker {}:{} as {}",
            settings.host, settings.port, client_id
        );
        let handle = tokio::spawn(run_event_loop(event_loop, events_tx, connected.clone()));

        (
            Self {
                client,
                connected,
                event_loop: Mutex::new(Some(handle)),
            },
            events_rx,
        )
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    events: mpsc::UnboundedSender<TransportEvent>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                connected.store(true, Ordering::Release);
                if events.send(TransportEvent::Connected).is_err() {
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                let event = TransportEvent::Message {
                    topic: publish.topic,
                    payload,
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                connected.store(false, Ordering::Release);
                debug!("MQTT disconnect sent, stopping event loop");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                if connected.swap(false, Ordering::AcqRel) {
                    if events
                        .send(TransportEvent::ConnectionLost(e.to_string()))
                        .is_err()
                    {
                        break;
                    }
                } else {
                    debug!("MQTT broker still unreachable: {}", e);
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

impl Transport for MqttTransport {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        payload: &'a str,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        async move {
            if !self.is_connected() {
                return Err(TransportError::NotConnected);
            }
            self.client
                .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
                .await
                .map_err(|e| TransportError::Publish {
                    topic: topic.to_string(),
                    reason: e.to_string(),
                })
        }
        .boxed()
    }

    fn subscribe<'a>(&'a self, filter: &'a str) -> BoxFuture<'a, Result<(), TransportError>> {
        async move {
            self.client
                .subscribe(filter, QoS::AtLeastOnce)
                .await
                .map_err(|e| TransportError::Subscribe {
                    filter: filter.to_string(),
                    reason: e.to_string(),
                })
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        async move {
            let handle = self
                .event_loop
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take();

            let result = self
                .client
                .disconnect()
                .await
                .map_err(|e| TransportError::Disconnect(e.to_string()));

            if let Some(mut handle) = handle {
                if tokio::time::timeout(DISCONNECT_GRACE, &mut handle).await.is_err() {
                    warn!("MQTT event loop did not stop in time, aborting it");
                    handle.abort();
                }
            }
            self.connected.store(false, Ordering::Release);

            if let Err(e) = &result {
                error!("Could not disconnect from MQTT broker: {}", e);
            }
            result
        }
        .boxed()
    }
}
