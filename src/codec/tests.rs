use super::topic::{COMMAND_PREFIX, STATE_PREFIX};
use super::{Address, DeviceType, TopicKind, broadcast_targets, build, extract, parse};
use crate::utils::error::TopicError;
use proptest::prelude::*;

const PAYLOAD: &str = r#"{"state":"ON","level":50}"#;

#[test]
fn test_extract_level() {
    assert_eq!(extract(PAYLOAD, "\"level\":", 3), "50");
}

#[test]
fn test_extract_quoted_value() {
    assert_eq!(extract(PAYLOAD, "\"state\":\"", 3), "ON");
}

#[test]
fn test_extract_missing_field_is_empty() {
    assert_eq!(extract(PAYLOAD, "\"missing\":", 3), "");
}

#[test]
fn test_extract_bounded_by_max_len() {
    let payload = r#"{"bulb_mode":"white","level":100}"#;
    assert_eq!(extract(payload, "\"bulb_mode\":\"", 5), "white");
    assert_eq!(extract(payload, "\"bulb_mode\":\"", 3), "whi");
    assert_eq!(extract(payload, "\"level\":", 3), "100");
}

#[test]
fn test_extract_stops_at_end_of_text() {
    assert_eq!(extract(r#""level":7"#, "\"level\":", 3), "7");
    assert_eq!(extract(r#""level":"#, "\"level\":", 3), "");
}

#[test]
fn test_extract_comma_takes_priority_over_brace_and_quote() {
    // both ',' and '}' present: comma wins
    assert_eq!(extract(r#"{"a":1,"b":2}"#, "\"a\":", 5), "1");
    assert_eq!(extract(r#"{"hue":12},"x"#, "\"hue\":", 6), "12}");
    // comma cut is followed by a quote cut
    assert_eq!(extract(r#"{"m":"ab","c":1}"#, "\"m\":\"", 6), "ab");
}

#[test]
fn test_extract_quote_before_brace() {
    assert_eq!(extract(r#"{"state":"OFF"}"#, "\"state\":\"", 5), "OFF");
}

#[test]
fn test_extract_brace_only() {
    assert_eq!(extract(r#"{"level":9}"#, "\"level\":", 3), "9");
}

#[test]
fn test_extract_no_delimiter_returns_bounded_slice() {
    assert_eq!(extract("key=abcdef", "key=", 4), "abcd");
}

#[test]
fn test_build_command_and_state_topics() {
    assert_eq!(
        build(TopicKind::Command, "0x01", DeviceType::RgbCct, 2),
        "milight/commands/0x01/rgb_cct/2"
    );
    let addr = Address::new("0xAB", DeviceType::Fut089, 7);
    assert_eq!(addr.state_topic(), "milight/states/0xAB/fut089/7");
    assert_eq!(addr.command_topic(), "milight/commands/0xAB/fut089/7");
}

#[test]
fn test_parse_state_topic() {
    let addr = parse("milight/states/0x01/rgbw/3").unwrap();
    assert_eq!(addr, Address::new("0x01", DeviceType::Rgbw, 3));
}

#[test]
fn test_parse_rejects_bad_topics() {
    assert!(matches!(
        parse("zigbee/states/0x01/rgb/1"),
        Err(TopicError::UnknownPrefix(_))
    ));
    assert!(matches!(
        parse("milight/states/0x01/rgb"),
        Err(TopicError::SegmentCount(_))
    ));
    assert!(matches!(
        parse("milight/states/0x01/rgb/1/extra"),
        Err(TopicError::SegmentCount(_))
    ));
    assert!(matches!(
        parse("milight/states/0x01/rgbww/1"),
        Err(TopicError::UnknownDeviceType(_))
    ));
    assert!(matches!(
        parse("milight/states/0x01/rgb/9"),
        Err(TopicError::InvalidGroup(_))
    ));
    assert!(matches!(
        parse("milight/states/0x01/rgb/x"),
        Err(TopicError::InvalidGroup(_))
    ));
}

#[test]
fn test_broadcast_expands_ordinary_remote_to_four_groups() {
    let addr = parse("milight/states/0x01/rgb_cct/0").unwrap();
    let groups: Vec<u8> = broadcast_targets(&addr).iter().map(|a| a.group_id).collect();
    assert_eq!(groups, vec![1, 2, 3, 4]);
}

#[test]
fn test_broadcast_expands_fut089_to_eight_groups() {
    let addr = parse("milight/states/0x01/fut089/0").unwrap();
    let targets = broadcast_targets(&addr);
    let groups: Vec<u8> = targets.iter().map(|a| a.group_id).collect();
    assert_eq!(groups, (1..=8).collect::<Vec<u8>>());
    assert!(targets.iter().all(|a| a.remote_code == "0x01"));
}

#[test]
fn test_non_broadcast_dispatches_once() {
    let addr = parse("milight/states/0x01/rgb_cct/2").unwrap();
    assert_eq!(broadcast_targets(&addr), vec![addr]);
}

#[test]
fn test_device_type_capabilities() {
    assert!(DeviceType::Cct.is_white_only());
    assert!(DeviceType::Fut091.is_white_only());
    assert!(!DeviceType::Rgbw.is_white_only());
    assert!(DeviceType::RgbCct.has_tunable_white());
    assert!(!DeviceType::Rgb.has_tunable_white());
}

fn device_type_strategy() -> impl Strategy<Value = DeviceType> {
    proptest::sample::select(DeviceType::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_topic_round_trip(
        code in "0x[0-9A-F]{1,4}",
        device_type in device_type_strategy(),
        group in 0u8..=8,
        state in any::<bool>(),
    ) {
        let kind = if state { TopicKind::State } else { TopicKind::Command };
        let topic = build(kind, &code, device_type, group);
        prop_assert!(topic.starts_with(STATE_PREFIX) || topic.starts_with(COMMAND_PREFIX));
        let parsed = parse(&topic).unwrap();
        prop_assert_eq!(parsed, Address::new(code, device_type, group));
    }
}
