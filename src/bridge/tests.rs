use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::mpsc;

use super::Bridge;
use super::engine::{DISCONNECTED_DETAIL, POLL_OFFLINE_DETAIL};
use super::sink::deliver;
use crate::codec::{Address, DeviceType};
use crate::config::Settings;
use crate::decoder::{ChannelKind, ChannelUpdate, ChannelValue, Delivery};
use crate::globe::GlobeCommand;
use crate::testing::{RecordingSink, RecordingTransport};
use crate::transport::{LinkStatus, TransportEvent};

struct Running {
    bridge: Bridge,
    transport: Arc<RecordingTransport>,
    sink: Arc<RecordingSink>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

fn start() -> Running {
    let transport = Arc::new(RecordingTransport::new());
    let sink = Arc::new(RecordingSink::new());
    let (events, events_rx) = mpsc::unbounded_channel();
    let bridge = Bridge::start(
        Settings::default(),
        transport.clone(),
        events_rx,
        sink.clone(),
    );
    Running {
        bridge,
        transport,
        sink,
        events,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(500)).await;
}

#[test]
fn test_deliver_routes_by_delivery_kind() {
    let sink = RecordingSink::new();
    let prefix = "espmilighthub:rgb:hub:0x011:";

    deliver(
        &sink,
        &ChannelUpdate::state(prefix, ChannelKind::Level, ChannelValue::Percent(5)),
    );
    deliver(
        &sink,
        &ChannelUpdate::command(prefix, ChannelKind::BulbMode, ChannelValue::Text("white".into())),
    );

    let delivered = sink.take();
    assert_eq!(delivered[0].delivery, Delivery::State);
    assert_eq!(delivered[0].channel_id, "espmilighthub:rgb:hub:0x011:level");
    assert_eq!(delivered[1].delivery, Delivery::Command);
    assert_eq!(delivered[1].channel_id, "espmilighthub:rgb:hub:0x011:bulbmode");
}

#[tokio::test(start_paused = true)]
async fn test_bridge_starts_offline() {
    let running = start();
    let status = running.bridge.status();
    assert!(!status.borrow().is_online());
    assert!(!running.bridge.context().is_online());
    assert_eq!(running.bridge.context().broker_address(), "127.0.0.1:1883");
}

#[tokio::test(start_paused = true)]
async fn test_connected_goes_online_and_subscribes() {
    let running = start();

    running.events.send(TransportEvent::Connected).unwrap();
    settle().await;

    assert_eq!(*running.bridge.status().borrow(), LinkStatus::Online);
    assert_eq!(
        *running.transport.subscribed.lock().unwrap(),
        vec!["milight/states/#".to_string()]
    );

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(running.transport.subscribed.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_subscribes_again() {
    let running = start();

    running.events.send(TransportEvent::Connected).unwrap();
    settle().await;
    running
        .events
        .send(TransportEvent::ConnectionLost("reset by peer".to_string()))
        .unwrap();
    settle().await;
    assert_eq!(
        running.bridge.context().status(),
        LinkStatus::offline("MQTT broker connection lost: reset by peer")
    );

    running.events.send(TransportEvent::Connected).unwrap();
    settle().await;
    assert_eq!(running.transport.subscribed.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_poller_reports_failed_connection() {
    let running = start();

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(
        running.bridge.context().status(),
        LinkStatus::offline(POLL_OFFLINE_DETAIL)
    );
    assert!(running.transport.subscribed.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_state_messages_reach_sink_once_online() {
    let running = start();

    running
        .events
        .send(TransportEvent::Message {
            topic: "milight/states/0x01/rgb_cct/0".to_string(),
            payload: r#"{"state":"ON"}"#.to_string(),
        })
        .unwrap();
    settle().await;
    assert_eq!(running.sink.len(), 0);

    running.events.send(TransportEvent::Connected).unwrap();
    settle().await;
    assert_eq!(running.sink.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_globe_commands_publish_once_online() {
    let running = start();
    let mut globe = running
        .bridge
        .globe(Address::new("0x0A", DeviceType::Rgbw, 3));

    globe
        .handle_command(ChannelKind::Level, GlobeCommand::Percent(25))
        .unwrap();
    settle().await;
    assert!(running.transport.pairs().is_empty());

    running.events.send(TransportEvent::Connected).unwrap();
    settle().await;
    assert_eq!(
        running.transport.pairs(),
        vec![(
            "milight/commands/0x0A/rgbw/3".to_string(),
            r#"{"state":"ON","level":25}"#.to_string()
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_disconnects_and_reports_offline() {
    let running = start();
    let status = running.bridge.status();
    let context = running.bridge.context();

    running.events.send(TransportEvent::Connected).unwrap();
    settle().await;

    running.bridge.shutdown().await.unwrap();
    assert!(running.transport.disconnected.load(Ordering::SeqCst));
    assert_eq!(*status.borrow(), LinkStatus::offline(DISCONNECTED_DETAIL));
    assert!(!context.is_online());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_waits_for_in_flight_publish() {
    let transport = Arc::new(RecordingTransport::stalling(Duration::from_millis(200)));
    let (events, events_rx) = mpsc::unbounded_channel();
    let bridge = Bridge::start(
        Settings::default(),
        transport.clone(),
        events_rx,
        Arc::new(RecordingSink::new()),
    );

    let mut status = bridge.status();
    events.send(TransportEvent::Connected).unwrap();
    status.wait_for(LinkStatus::is_online).await.unwrap();

    let mut globe = bridge.globe(Address::new("0x0A", DeviceType::Rgb, 1));
    globe
        .handle_command(ChannelKind::Level, GlobeCommand::Percent(60))
        .unwrap();
    while !transport.publish_started.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    bridge.shutdown().await.unwrap();
    assert!(transport.disconnected.load(Ordering::SeqCst));
    assert!(!transport.published_after_disconnect.load(Ordering::SeqCst));
    assert_eq!(
        transport.payloads(),
        vec![r#"{"state":"ON","level":60}"#.to_string()]
    );
}
