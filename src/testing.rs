//! Recording doubles for the transport and the channel sink, shared by the
//! unit tests of every module.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::Instant;

use crate::bridge::ChannelSink;
use crate::decoder::{ChannelValue, Delivery};
use crate::transport::Transport;
use crate::utils::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub at: Instant,
}

#[derive(Default)]
pub struct RecordingTransport {
    pub published: Mutex<Vec<Published>>,
    pub subscribed: Mutex<Vec<String>>,
    pub fail_publish: AtomicBool,
    pub disconnected: AtomicBool,
    /// Blocks the worker thread inside `publish` for this long.
    pub publish_stall: Mutex<Option<Duration>>,
    pub publish_started: AtomicBool,
    pub published_after_disconnect: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stalling(stall: Duration) -> Self {
        let transport = Self::default();
        *transport.publish_stall.lock().unwrap() = Some(stall);
        transport
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.fail_publish.store(true, Ordering::SeqCst);
        transport
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|p| (p.topic.clone(), p.payload.clone()))
            .collect()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.pairs().into_iter().map(|(_, payload)| payload).collect()
    }
}

impl Transport for RecordingTransport {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        payload: &'a str,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        async move {
            self.publish_started.store(true, Ordering::SeqCst);
            let stall = *self.publish_stall.lock().unwrap();
            if let Some(stall) = stall {
                std::thread::sleep(stall);
            }
            if self.disconnected.load(Ordering::SeqCst) {
                self.published_after_disconnect.store(true, Ordering::SeqCst);
            }
            if self.fail_publish.load(Ordering::SeqCst) {
                return Err(TransportError::Publish {
                    topic: topic.to_string(),
                    reason: "broker refused".to_string(),
                });
            }
            self.published.lock().unwrap().push(Published {
                topic: topic.to_string(),
                payload: payload.to_string(),
                at: Instant::now(),
            });
            Ok(())
        }
        .boxed()
    }

    fn subscribe<'a>(&'a self, filter: &'a str) -> BoxFuture<'a, Result<(), TransportError>> {
        async move {
            self.subscribed.lock().unwrap().push(filter.to_string());
            Ok(())
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        async move {
            self.disconnected.store(true, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub delivery: Delivery,
    pub channel_id: String,
    pub value: ChannelValue,
}

#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<Delivered>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Delivered> {
        std::mem::take(&mut *self.delivered.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

impl ChannelSink for RecordingSink {
    fn update_state(&self, channel_id: &str, value: &ChannelValue) {
        self.delivered.lock().unwrap().push(Delivered {
            delivery: Delivery::State,
            channel_id: channel_id.to_string(),
            value: value.clone(),
        });
    }

    fn post_command(&self, channel_id: &str, value: &ChannelValue) {
        self.delivered.lock().unwrap().push(Delivered {
            delivery: Delivery::Command,
            channel_id: channel_id.to_string(),
            value: value.clone(),
        });
    }
}
