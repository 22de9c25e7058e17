//! Device-state decoder.
//!
//! Consumes one `(address, payload)` pair and produces the ordered channel
//! updates for that globe. The level/state pass always runs before the
//! bulb-mode pass because colour updates reuse the level it computes.

use tracing::{trace, warn};

use crate::codec::{Address, extract};
use crate::config::GlobeSettings;
use crate::decoder::channel::{ChannelKind, ChannelUpdate, ChannelValue, Hsb, channel_prefix};

const STATE_KEY: &str = "\"state\":\"";
const LEVEL_KEY: &str = "\"level\":";
const BULB_MODE_KEY: &str = "\"bulb_mode\":\"";
const COLOR_TEMP_KEY: &str = "\"color_temp\":";
const HUE_KEY: &str = "\"hue\":";
const SATURATION_KEY: &str = "\"saturation\":";
const MODE_KEY: &str = "\"mode\":";

/// Disco mode reported while the globe is not running a scene.
pub const DISCO_DISABLED: i32 = -1;

/// Decodes state payloads for one bridge.
///
/// The decoder only reads its configuration, so identical inputs always
/// produce identical update sequences.
#[derive(Debug, Clone)]
pub struct StateDecoder {
    bridge_id: String,
    settings: GlobeSettings,
}

impl StateDecoder {
    pub fn new(bridge_id: impl Into<String>, settings: GlobeSettings) -> Self {
        Self {
            bridge_id: bridge_id.into(),
            settings,
        }
    }

    pub fn decode(&self, address: &Address, payload: &str) -> Vec<ChannelUpdate> {
        let prefix = channel_prefix(&self.bridge_id, address);
        let mut updates = Vec::new();

        let state = extract(payload, STATE_KEY, 3);
        let level = extract(payload, LEVEL_KEY, 3);

        trace!(
            payload,
            prefix = prefix.as_str(),
            state,
            level,
            "processing incoming state"
        );

        // Level 0 and OFF are the same thing for the globe.
        let mut current_level: u8 = 1;
        if !level.is_empty() {
            if level == "0" || state.contains("OFF") {
                updates.push(ChannelUpdate::state(
                    &prefix,
                    ChannelKind::Level,
                    ChannelValue::Percent(0),
                ));
                updates.push(ChannelUpdate::state(
                    &prefix,
                    ChannelKind::Level,
                    ChannelValue::OnOff(false),
                ));
                if !self.settings.level_follows_colour {
                    return updates;
                }
                current_level = 0;
            } else {
                match parse_percent(level) {
                    Some(parsed) => {
                        current_level = parsed;
                        updates.push(ChannelUpdate::state(
                            &prefix,
                            ChannelKind::Level,
                            ChannelValue::Percent(parsed),
                        ));
                    }
                    None => warn!(level, "ignoring non-numeric level in state message"),
                }
            }
        } else if state.contains("ON") || state.contains("OFF") {
            updates.push(ChannelUpdate::state(
                &prefix,
                ChannelKind::Level,
                ChannelValue::OnOff(state == "ON"),
            ));
        }

        let white_only = address.device_type.is_white_only();
        match extract(payload, BULB_MODE_KEY, 5) {
            "white" => {
                if !white_only {
                    push_mode(&mut updates, &prefix, "white");
                    updates.push(ChannelUpdate::state(
                        &prefix,
                        ChannelKind::Colour,
                        ChannelValue::Hsb(Hsb::new(0, 0, current_level)),
                    ));
                    updates.push(disco_disabled(&prefix));
                }
                let raw = extract(payload, COLOR_TEMP_KEY, 3);
                if !raw.is_empty() {
                    match raw.parse::<f64>() {
                        Ok(raw) => updates.push(ChannelUpdate::state(
                            &prefix,
                            ChannelKind::ColourTemperature,
                            ChannelValue::Percent(colour_temp_percent(raw)),
                        )),
                        Err(_) => warn!(color_temp = raw, "ignoring non-numeric colour temperature"),
                    }
                }
            }
            "color" => {
                updates.push(ChannelUpdate::state(
                    &prefix,
                    ChannelKind::BulbMode,
                    ChannelValue::Text("color".to_string()),
                ));
                updates.push(disco_disabled(&prefix));
                updates.push(ChannelUpdate::command(
                    &prefix,
                    ChannelKind::BulbMode,
                    ChannelValue::Text("color".to_string()),
                ));

                let hue = extract(payload, HUE_KEY, 3);
                let saturation = match extract(payload, SATURATION_KEY, 3) {
                    "" => "100",
                    value => value,
                };
                if hue.is_empty() {
                    warn!("state message is in colour mode but has no hue value");
                } else {
                    match (hue.parse::<u16>(), parse_percent(saturation)) {
                        (Ok(hue), Some(saturation)) => updates.push(ChannelUpdate::state(
                            &prefix,
                            ChannelKind::Colour,
                            ChannelValue::Hsb(Hsb::new(hue, saturation, current_level)),
                        )),
                        _ => warn!(hue, saturation, "ignoring malformed colour in state message"),
                    }
                }
            }
            "scene" => {
                if !white_only {
                    updates.push(ChannelUpdate::state(
                        &prefix,
                        ChannelKind::BulbMode,
                        ChannelValue::Text("scene".to_string()),
                    ));
                    updates.push(ChannelUpdate::command(
                        &prefix,
                        ChannelKind::BulbMode,
                        ChannelValue::Text("scene".to_string()),
                    ));
                }
                let mode = extract(payload, MODE_KEY, 1);
                if let Ok(mode) = mode.parse::<i32>() {
                    updates.push(ChannelUpdate::state(
                        &prefix,
                        ChannelKind::DiscoMode,
                        ChannelValue::Decimal(mode),
                    ));
                }
            }
            "night" => {
                if !white_only {
                    push_mode(&mut updates, &prefix, "night");
                    if self.settings.one_triggers_night_mode {
                        updates.push(ChannelUpdate::state(
                            &prefix,
                            ChannelKind::Level,
                            ChannelValue::Percent(1),
                        ));
                    }
                }
            }
            _ => {}
        }

        updates
    }
}

/// Posts the mode as a command first so listeners see it before the reflected state.
fn push_mode(updates: &mut Vec<ChannelUpdate>, prefix: &str, mode: &str) {
    updates.push(ChannelUpdate::command(
        prefix,
        ChannelKind::BulbMode,
        ChannelValue::Text(mode.to_string()),
    ));
    updates.push(ChannelUpdate::state(
        prefix,
        ChannelKind::BulbMode,
        ChannelValue::Text(mode.to_string()),
    ));
}

fn disco_disabled(prefix: &str) -> ChannelUpdate {
    ChannelUpdate::state(
        prefix,
        ChannelKind::DiscoMode,
        ChannelValue::Decimal(DISCO_DISABLED),
    )
}

fn parse_percent(raw: &str) -> Option<u8> {
    let value = raw.parse::<f64>().ok()?;
    Some(value.round().clamp(0.0, 100.0) as u8)
}

/// Converts the hub's raw colour temperature (153..=370) to a 0..=100 percent.
pub fn colour_temp_percent(raw: f64) -> u8 {
    (((raw / 2.17) - 171.0) * -1.0).round().clamp(0.0, 100.0) as u8
}
