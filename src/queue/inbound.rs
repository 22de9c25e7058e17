//! Inbound state queue.
//!
//! The transport's event pump is the only producer and the drain task the
//! only consumer. While the link is offline the drain task waits and messages
//! accumulate. Once the queue runs dry the drain task exits; the next arrival
//! starts a new one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::bridge::sink::{ChannelSink, deliver};
use crate::codec::{broadcast_targets, parse};
use crate::decoder::StateDecoder;
use crate::transport::LinkStatus;

/// A state notification as received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMessage {
    pub topic: String,
    pub payload: String,
    pub received_at: DateTime<Utc>,
}

impl StateMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }
}

/// Decodes state messages and feeds the resulting updates to the sink.
#[derive(Clone)]
pub struct StateDispatcher {
    decoder: StateDecoder,
    sink: Arc<dyn ChannelSink>,
}

impl StateDispatcher {
    pub fn new(decoder: StateDecoder, sink: Arc<dyn ChannelSink>) -> Self {
        Self { decoder, sink }
    }

    /// Returns the number of globes the message was dispatched to.
    pub fn dispatch(&self, message: &StateMessage) -> usize {
        let address = match parse(&message.topic) {
            Ok(address) => address,
            Err(e) => {
                warn!("Skipping state message on undecodable topic: {}", e);
                return 0;
            }
        };

        let targets = broadcast_targets(&address);
        for target in &targets {
            for update in self.decoder.decode(target, &message.payload) {
                deliver(self.sink.as_ref(), &update);
            }
        }

        trace!(
            topic = message.topic.as_str(),
            targets = targets.len(),
            queued_ms = (Utc::now() - message.received_at).num_milliseconds(),
            "dispatched state message"
        );
        targets.len()
    }
}

#[derive(Default)]
struct InboundState {
    messages: VecDeque<StateMessage>,
    drain: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<InboundState>,
    dispatcher: StateDispatcher,
    status: watch::Receiver<LinkStatus>,
    interval: Duration,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, InboundState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Queue of received state messages, drained one per tick while online.
pub struct InboundQueue {
    shared: Arc<Shared>,
}

impl InboundQueue {
    pub fn new(
        dispatcher: StateDispatcher,
        status: watch::Receiver<LinkStatus>,
        interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(InboundState::default()),
                dispatcher,
                status,
                interval,
            }),
        }
    }

    /// Appends a message and starts the drain task if none is running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_message_arrived(&self, topic: impl Into<String>, payload: impl Into<String>) {
        let message = StateMessage::new(topic, payload);
        debug!("Received state {} : {}", message.topic, message.payload);

        let mut state = self.shared.lock();
        state.messages.push_back(message);
        if state.drain.is_none() {
            state.drain = Some(tokio::spawn(run_drain(self.shared.clone())));
        }
    }

    pub fn len(&self) -> usize {
        self.shared.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_draining(&self) -> bool {
        self.shared.lock().drain.is_some()
    }

    /// Cancels the drain task, returning its handle so the caller can wait
    /// for it to stop, and discards messages not yet drained.
    pub fn shutdown(&self) -> Option<JoinHandle<()>> {
        let mut state = self.shared.lock();
        let drain = state.drain.take();
        if let Some(drain) = &drain {
            drain.abort();
        }
        if !state.messages.is_empty() {
            warn!("Discarding {} undrained state messages", state.messages.len());
            state.messages.clear();
        }
        drain
    }
}

/// Dispatches one message per tick until the queue is empty.
///
/// The task unregisters itself under the queue lock, so a concurrent arrival
/// either sees it running or starts a new one.
async fn run_drain(shared: Arc<Shared>) {
    let mut status = shared.status.clone();
    loop {
        let online = status.borrow_and_update().is_online();
        if !online && status.wait_for(LinkStatus::is_online).await.is_err() {
            break;
        }

        let next = {
            let mut state = shared.lock();
            let next = state.messages.pop_front();
            if next.is_none() {
                state.drain = None;
            }
            next
        };
        let Some(message) = next else {
            trace!("Inbound queue drained, stopping drain task");
            return;
        };
        shared.dispatcher.dispatch(&message);

        tokio::time::sleep(shared.interval).await;
    }

    shared.lock().drain = None;
}
