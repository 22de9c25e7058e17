use std::fmt;

use crate::codec::Address;

/// Namespace of every channel id produced by the bridge.
pub const BINDING_ID: &str = "espmilighthub";

/// Channel of a globe that an update or command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Level,
    Colour,
    ColourTemperature,
    DiscoMode,
    BulbMode,
    BulbCommand,
    SendBulbCommand,
}

impl ChannelKind {
    pub fn id(&self) -> &'static str {
        match self {
            ChannelKind::Level => "level",
            ChannelKind::Colour => "colour",
            ChannelKind::ColourTemperature => "colourtemperature",
            ChannelKind::DiscoMode => "discomode",
            ChannelKind::BulbMode => "bulbmode",
            ChannelKind::BulbCommand => "bulbcommand",
            ChannelKind::SendBulbCommand => "sendbulbcommand",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Hue (degrees), saturation and brightness (percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsb {
    pub hue: u16,
    pub saturation: u8,
    pub brightness: u8,
}

impl Hsb {
    pub fn new(hue: u16, saturation: u8, brightness: u8) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }
}

impl fmt::Display for Hsb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.hue, self.saturation, self.brightness)
    }
}

/// Value carried by a channel update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelValue {
    Percent(u8),
    OnOff(bool),
    Hsb(Hsb),
    Decimal(i32),
    Text(String),
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelValue::Percent(p) => write!(f, "{p}"),
            ChannelValue::OnOff(true) => f.write_str("ON"),
            ChannelValue::OnOff(false) => f.write_str("OFF"),
            ChannelValue::Hsb(hsb) => write!(f, "{hsb}"),
            ChannelValue::Decimal(d) => write!(f, "{d}"),
            ChannelValue::Text(t) => f.write_str(t),
        }
    }
}

/// How the sink should apply an update.
///
/// `State` passively reflects a value; `Command` re-triggers whatever
/// listens on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    State,
    Command,
}

/// One decoded fact about a globe channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUpdate {
    /// `{binding}:{type}:{bridge}:{remote}{group}:`
    pub prefix: String,
    pub kind: ChannelKind,
    pub value: ChannelValue,
    pub delivery: Delivery,
}

impl ChannelUpdate {
    pub fn state(prefix: &str, kind: ChannelKind, value: ChannelValue) -> Self {
        Self {
            prefix: prefix.to_string(),
            kind,
            value,
            delivery: Delivery::State,
        }
    }

    pub fn command(prefix: &str, kind: ChannelKind, value: ChannelValue) -> Self {
        Self {
            prefix: prefix.to_string(),
            kind,
            value,
            delivery: Delivery::Command,
        }
    }

    /// Full channel id, e.g. `espmilighthub:rgb_cct:hub:0x011:level`.
    pub fn channel_id(&self) -> String {
        format!("{}{}", self.prefix, self.kind)
    }
}

/// Builds the channel id prefix of a globe on a given bridge.
pub fn channel_prefix(bridge_id: &str, address: &Address) -> String {
    format!(
        "{}:{}:{}:{}{}:",
        BINDING_ID, address.device_type, bridge_id, address.remote_code, address.group_id
    )
}
