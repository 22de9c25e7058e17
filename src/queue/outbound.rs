//! Outbound command queue.
//!
//! Commands are published one per tick by a lazily spawned ticker task. When
//! a burst of commands targets the same globe (a slider drag), only the most
//! recent one is kept and the ticker slows down to the same-globe delay.
//!
//! Concurrency notes:
//! - `enqueue` is synchronous and may be called from any thread; it never
//!   blocks beyond the queue lock and never performs I/O.
//! - The ticker is the only consumer. It drops the lock before publishing.
//! - Topics and payloads live in two parallel FIFOs that are only ever
//!   mutated together under the same lock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::config::PacingSettings;
use crate::transport::{LinkStatus, Transport};
use crate::utils::error::QueueError;

/// Written before OFF when power failures should bring globes back at minimum
/// dim. Never removed by deduplication.
pub const POWER_FAIL_SENTINEL: &str = r#"{"state":"ON","level":0}"#;

/// Publish cadence of the outbound ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacingMode {
    #[default]
    Normal,
    /// Consecutive commands hit the same globe; use the same-globe delay.
    Throttled,
}

impl PacingMode {
    pub fn interval(&self, pacing: &PacingSettings) -> Duration {
        match self {
            PacingMode::Normal => Duration::from_millis(pacing.normal_delay_ms),
            PacingMode::Throttled => Duration::from_millis(pacing.same_globe_delay_ms),
        }
    }
}

/// A command waiting to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub topic: String,
    pub payload: String,
}

/// Topic and payload FIFOs sharing one index space.
#[derive(Debug, Default)]
struct PairedFifo {
    topics: VecDeque<String>,
    payloads: VecDeque<String>,
}

/// The two halves of the FIFO disagree on their length.
#[derive(Debug)]
struct Desync;

impl PairedFifo {
    fn len(&self) -> usize {
        self.topics.len()
    }

    fn push_back(&mut self, topic: &str, payload: &str) {
        self.topics.push_back(topic.to_string());
        self.payloads.push_back(payload.to_string());
    }

    fn pop_back(&mut self) {
        self.topics.pop_back();
        self.payloads.pop_back();
    }

    fn last_topic(&self) -> Option<&str> {
        self.topics.back().map(String::as_str)
    }

    fn last_payload(&self) -> Option<&str> {
        self.payloads.back().map(String::as_str)
    }

    fn pop_front(&mut self) -> Result<Option<Command>, Desync> {
        match (self.topics.pop_front(), self.payloads.pop_front()) {
            (Some(topic), Some(payload)) => Ok(Some(Command { topic, payload })),
            (None, None) => Ok(None),
            _ => Err(Desync),
        }
    }

    fn clear(&mut self) {
        self.topics.clear();
        self.payloads.clear();
    }
}

#[derive(Debug, Default)]
struct OutboundState {
    fifo: PairedFifo,
    pacing: PacingMode,
    ticker: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<OutboundState>,
    transport: Arc<dyn Transport>,
    pacing: PacingSettings,
    status: watch::Receiver<LinkStatus>,
    runtime: Handle,
}

impl OutboundState {
    /// Pops the oldest command, wiping both FIFOs if they fell out of step.
    fn pop_front_or_recover(&mut self) -> Option<Command> {
        match self.fifo.pop_front() {
            Ok(command) => command,
            Err(Desync) => {
                warn!("Outgoing queue topics and payloads are out of step, wiping the queue");
                self.fifo.clear();
                None
            }
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, OutboundState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Paced, deduplicating queue of outbound commands. Cloning shares the queue.
#[derive(Clone)]
pub struct OutboundQueue {
    shared: Arc<Shared>,
}

impl OutboundQueue {
    /// Creates an empty queue in `Normal` pacing.
    ///
    /// Must be called from within a tokio runtime; the ticker is spawned on it.
    pub fn new(
        transport: Arc<dyn Transport>,
        pacing: PacingSettings,
        status: watch::Receiver<LinkStatus>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(OutboundState::default()),
                transport,
                pacing,
                status,
                runtime: Handle::current(),
            }),
        }
    }

    /// Queues a command for publishing.
    ///
    /// If more than one command is queued and the newest one targets the same
    /// topic, the newest one is replaced (unless it is the power-fail
    /// sentinel) and pacing switches to `Throttled`. Any enqueue that does not
    /// replace switches pacing back to `Normal`.
    pub fn enqueue(&self, topic: &str, payload: &str) -> Result<(), QueueError> {
        if topic.is_empty() || payload.is_empty() {
            error!(
                "Empty value in requested outgoing message: '{}' : '{}'",
                topic, payload
            );
            return Err(QueueError::InvalidArgument {
                topic: topic.to_string(),
                payload: payload.to_string(),
            });
        }

        let mut state = self.shared.lock();

        let replaces_last = state.fifo.len() > 1
            && state.fifo.last_topic() == Some(topic)
            && state.fifo.last_payload() != Some(POWER_FAIL_SENTINEL);

        if replaces_last {
            state.fifo.pop_back();
            debug!("Message reduction removed a queued command for {}", topic);
            if state.pacing == PacingMode::Normal {
                state.pacing = PacingMode::Throttled;
                debug!("Changing outgoing queue to same-globe speed");
            }
        } else if state.pacing == PacingMode::Throttled {
            state.pacing = PacingMode::Normal;
            debug!("Changing outgoing queue back to normal speed");
        }

        state.fifo.push_back(topic, payload);

        if state.ticker.is_none() {
            let shared = self.shared.clone();
            state.ticker = Some(self.shared.runtime.spawn(run_ticker(shared)));
            trace!("Started outgoing ticker");
        }

        Ok(())
    }

    /// Removes and returns the oldest command without publishing it.
    pub fn next_command(&self) -> Option<Command> {
        self.shared.lock().pop_front_or_recover()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pacing_mode(&self) -> PacingMode {
        self.shared.lock().pacing
    }

    pub fn is_ticking(&self) -> bool {
        self.shared.lock().ticker.is_some()
    }

    /// Cancels the ticker and returns its handle so the caller can wait for
    /// it to stop. Queued commands stay queued.
    pub fn shutdown(&self) -> Option<JoinHandle<()>> {
        let ticker = self.shared.lock().ticker.take();
        if let Some(ticker) = &ticker {
            ticker.abort();
        }
        ticker
    }

    #[cfg(test)]
    pub(crate) fn fifo_lengths(&self) -> (usize, usize) {
        let state = self.shared.lock();
        (state.fifo.topics.len(), state.fifo.payloads.len())
    }

    #[cfg(test)]
    pub(crate) fn push_topic_only(&self, topic: &str) {
        self.shared.lock().fifo.topics.push_back(topic.to_string());
    }
}

/// Publishes one command per tick until the queue is drained.
///
/// While the link is offline commands stay queued. The ticker unregisters
/// itself under the queue lock so that a concurrent `enqueue` either sees it
/// running or starts a new one.
async fn run_ticker(shared: Arc<Shared>) {
    let mut status = shared.status.clone();
    loop {
        let online = status.borrow_and_update().is_online();
        if !online && status.wait_for(LinkStatus::is_online).await.is_err() {
            break;
        }

        let next = {
            let mut state = shared.lock();
            let next = state.pop_front_or_recover();
            if next.is_none() {
                state.ticker = None;
            }
            next
        };
        let Some(command) = next else {
            trace!("Outgoing queue drained, stopping ticker");
            return;
        };

        match shared
            .transport
            .publish(&command.topic, &command.payload)
            .await
        {
            Ok(()) => trace!(
                "Published {} to {}, {} more queued",
                command.payload,
                command.topic,
                shared.lock().fifo.len()
            ),
            Err(e) => error!("Could not send to MQTT broker, dropping command: {}", e),
        }

        let interval = shared.lock().pacing.interval(&shared.pacing);
        tokio::time::sleep(interval).await;
    }

    shared.lock().ticker = None;
}
