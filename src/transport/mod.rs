//! The `transport` module is the narrow seam to the pub/sub broker.
//!
//! It defines the `Transport` trait the queues publish through, the events a
//! transport reports back to the bridge, the link status derived from those
//! events, and an MQTT implementation built on `rumqttc`.

pub mod message;
pub mod mqtt;

use futures::future::BoxFuture;

use crate::utils::error::TransportError;

pub use message::{LinkStatus, TransportEvent};
pub use mqtt::MqttTransport;

/// Outbound half of a pub/sub connection.
///
/// Implementations publish at QoS 1 (at least once) without the retained flag.
pub trait Transport: Send + Sync + 'static {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        payload: &'a str,
    ) -> BoxFuture<'a, Result<(), TransportError>>;

    fn subscribe<'a>(&'a self, filter: &'a str) -> BoxFuture<'a, Result<(), TransportError>>;

    fn disconnect(&self) -> BoxFuture<'_, Result<(), TransportError>>;
}
