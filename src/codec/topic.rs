//! Topic addressing scheme.
//!
//! Commands go out on `milight/commands/{remote}/{type}/{group}` and states
//! come back on `milight/states/{remote}/{type}/{group}`.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::utils::error::TopicError;

pub const COMMAND_PREFIX: &str = "milight/commands/";
pub const STATE_PREFIX: &str = "milight/states/";

/// Highest group id any remote exposes (fut089 has eight zones).
pub const MAX_GROUP_ID: u8 = 8;

/// Kind of bulb or remote a topic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Rgb,
    Rgbw,
    RgbCct,
    Cct,
    Fut089,
    Fut091,
}

impl DeviceType {
    pub const ALL: [DeviceType; 6] = [
        DeviceType::Rgb,
        DeviceType::Rgbw,
        DeviceType::RgbCct,
        DeviceType::Cct,
        DeviceType::Fut089,
        DeviceType::Fut091,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Rgb => "rgb",
            DeviceType::Rgbw => "rgbw",
            DeviceType::RgbCct => "rgb_cct",
            DeviceType::Cct => "cct",
            DeviceType::Fut089 => "fut089",
            DeviceType::Fut091 => "fut091",
        }
    }

    /// White-only remotes. They report a mode but have no separate white
    /// channel, so mode echoes are not re-posted for them.
    pub fn is_white_only(&self) -> bool {
        matches!(self, DeviceType::Cct | DeviceType::Fut091)
    }

    /// Types with both colour and tunable white, which accept `color_temp`.
    pub fn has_tunable_white(&self) -> bool {
        matches!(self, DeviceType::RgbCct | DeviceType::Fut089)
    }

    /// Real groups addressed by a group-0 broadcast.
    pub fn broadcast_groups(&self) -> RangeInclusive<u8> {
        match self {
            DeviceType::Fut089 => 1..=MAX_GROUP_ID,
            _ => 1..=4,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TopicError::UnknownDeviceType(s.to_string()))
    }
}

/// Direction of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Command,
    State,
}

impl TopicKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            TopicKind::Command => COMMAND_PREFIX,
            TopicKind::State => STATE_PREFIX,
        }
    }
}

/// A globe address decoded from, or encoded into, a topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub remote_code: String,
    pub device_type: DeviceType,
    pub group_id: u8,
}

impl Address {
    pub fn new(remote_code: impl Into<String>, device_type: DeviceType, group_id: u8) -> Self {
        Self {
            remote_code: remote_code.into(),
            device_type,
            group_id,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.group_id == 0
    }

    pub fn command_topic(&self) -> String {
        build(TopicKind::Command, &self.remote_code, self.device_type, self.group_id)
    }

    pub fn state_topic(&self) -> String {
        build(TopicKind::State, &self.remote_code, self.device_type, self.group_id)
    }
}

/// `{type} {remote}{group}`, e.g. `rgb_cct 0x0A2`.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.device_type, self.remote_code, self.group_id)
    }
}

/// Builds `milight/{commands|states}/{remote}/{type}/{group}`.
pub fn build(kind: TopicKind, remote_code: &str, device_type: DeviceType, group_id: u8) -> String {
    format!("{}{}/{}/{}", kind.prefix(), remote_code, device_type, group_id)
}

/// Decodes a command or state topic into its address.
pub fn parse(topic: &str) -> Result<Address, TopicError> {
    let rest = topic
        .strip_prefix(STATE_PREFIX)
        .or_else(|| topic.strip_prefix(COMMAND_PREFIX))
        .ok_or_else(|| TopicError::UnknownPrefix(topic.to_string()))?;

    let segments: Vec<&str> = rest.split('/').collect();
    let &[remote_code, device_type, group] = segments.as_slice() else {
        return Err(TopicError::SegmentCount(topic.to_string()));
    };
    if remote_code.is_empty() {
        return Err(TopicError::SegmentCount(topic.to_string()));
    }

    let device_type: DeviceType = device_type.parse()?;
    let group_id = group
        .parse::<u8>()
        .ok()
        .filter(|g| *g <= MAX_GROUP_ID)
        .ok_or_else(|| TopicError::InvalidGroup(group.to_string()))?;

    Ok(Address::new(remote_code, device_type, group_id))
}

/// Expands a broadcast address into one address per real group.
///
/// Group 0 itself is not a target; any other group maps to itself.
pub fn broadcast_targets(address: &Address) -> Vec<Address> {
    if !address.is_broadcast() {
        return vec![address.clone()];
    }

    address
        .device_type
        .broadcast_groups()
        .map(|group_id| Address {
            group_id,
            ..address.clone()
        })
        .collect()
}
