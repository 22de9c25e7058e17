use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::bridge::BridgeContext;
use crate::codec::{Address, DeviceType};
use crate::decoder::{ChannelKind, ChannelValue, Hsb, channel_prefix};
use crate::globe::payload::CommandPayload;
use crate::utils::error::QueueError;

const FAVOURITE_WHITE: &str = "favourite_white";
const NIGHT_MODE: &str = "night_mode";
const SET_WHITE: &str = "set_white";

/// A command aimed at one globe channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobeCommand {
    Refresh,
    OnOff(bool),
    Percent(u8),
    Hsb(Hsb),
    Text(String),
    Decimal(i32),
}

/// One globe attached to a bridge.
pub struct Globe {
    address: Address,
    topic: String,
    context: Arc<BridgeContext>,
    saved_level: u8,
    last_command: Option<String>,
    bulb_mode: Option<String>,
}

impl Globe {
    pub fn new(address: Address, context: Arc<BridgeContext>) -> Self {
        let topic = address.command_topic();
        Self {
            address,
            topic,
            context,
            saved_level: 100,
            last_command: None,
            bulb_mode: None,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn saved_level(&self) -> u8 {
        self.saved_level
    }

    pub fn bulb_mode(&self) -> Option<&str> {
        self.bulb_mode.as_deref()
    }

    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    /// Encodes a command and queues the resulting payloads.
    pub fn handle_command(
        &mut self,
        channel: ChannelKind,
        command: GlobeCommand,
    ) -> Result<(), QueueError> {
        if command == GlobeCommand::Refresh {
            debug!("REFRESH requested for {} on {}", self.address, channel);
            return Ok(());
        }

        match channel {
            ChannelKind::Level => self.handle_level(command),
            ChannelKind::BulbMode => {
                if let GlobeCommand::Text(mode) = command {
                    debug!("Bulb mode is {}", mode);
                    self.bulb_mode = Some(mode);
                }
                Ok(())
            }
            ChannelKind::ColourTemperature => match command {
                GlobeCommand::Percent(percent) => {
                    let payload = CommandPayload {
                        level: Some(self.saved_level),
                        color_temp: Some(percent_to_colour_temp(percent)),
                        ..CommandPayload::on()
                    };
                    self.send(&payload)
                }
                other => self.ignore(channel, other),
            },
            ChannelKind::BulbCommand => match command {
                GlobeCommand::Text(text) => {
                    let sent = self.send_bulb_command(&text);
                    self.last_command = Some(text);
                    sent
                }
                other => self.ignore(channel, other),
            },
            ChannelKind::SendBulbCommand => {
                let text = match &self.last_command {
                    Some(text) => text.clone(),
                    None => {
                        let fallback = self.context.globe_settings().default_command.clone();
                        let channel_id = format!(
                            "{}{}",
                            channel_prefix(self.context.bridge_id(), &self.address),
                            ChannelKind::BulbCommand
                        );
                        self.context
                            .sink()
                            .update_state(&channel_id, &ChannelValue::Text(fallback.clone()));
                        self.last_command = Some(fallback.clone());
                        fallback
                    }
                };
                self.send_bulb_command(&text)
            }
            ChannelKind::DiscoMode => match command {
                GlobeCommand::Decimal(mode) => self.send(&CommandPayload::mode(mode)),
                GlobeCommand::Text(mode) => self.send(&CommandPayload::mode(mode)),
                other => self.ignore(channel, other),
            },
            ChannelKind::Colour => self.handle_colour(command),
        }
    }

    /// Applies a value the framework reflected back onto a channel.
    pub fn handle_update(&mut self, channel: ChannelKind, value: &ChannelValue) {
        if let (ChannelKind::BulbMode, ChannelValue::Text(mode)) = (channel, value) {
            self.bulb_mode = Some(mode.clone());
        }
    }

    /// Colour temperature for a brightness when dimming should warm the globe.
    pub fn auto_colour_temp(&self, brightness: u8) -> u16 {
        let settings = self.context.globe_settings();
        let max = f64::from(settings.favourite_white);
        let min = f64::from(settings.auto_ctemp_max_dimmed);
        if min <= max {
            error!(
                "auto_ctemp_max_dimmed is not above favourite_white, using favourite_white instead"
            );
            return settings.favourite_white;
        }
        (min - ((min - max) / 100.0) * f64::from(brightness)).round() as u16
    }

    fn handle_level(&mut self, command: GlobeCommand) -> Result<(), QueueError> {
        match command {
            GlobeCommand::OnOff(false) | GlobeCommand::Percent(0) => {
                if self.address.device_type == DeviceType::Cct {
                    self.send(&CommandPayload::off())
                } else {
                    self.turn_off()
                }
            }
            GlobeCommand::OnOff(true) => {
                if self.address.device_type == DeviceType::Cct {
                    self.send(&CommandPayload::on())
                } else {
                    self.send(&CommandPayload::on_at(self.saved_level))
                }
            }
            GlobeCommand::Percent(level) => self.dim_to(level),
            other => self.ignore(ChannelKind::Level, other),
        }
    }

    fn handle_colour(&mut self, command: GlobeCommand) -> Result<(), QueueError> {
        let context = self.context.clone();
        let settings = context.globe_settings();
        match command {
            GlobeCommand::OnOff(true) => self.send(&CommandPayload::on_at(self.saved_level)),
            GlobeCommand::OnOff(false) | GlobeCommand::Percent(0) => self.turn_off(),
            GlobeCommand::Hsb(hsb) => {
                if hsb.hue == settings.trigger_white_hue
                    && u16::from(hsb.saturation) == settings.trigger_white_sat
                {
                    if self.address.device_type.has_tunable_white() {
                        let favourite = settings.favourite_white;
                        self.send(&CommandPayload::white_at(favourite))
                    } else {
                        self.send(&CommandPayload::command(SET_WHITE))
                    }
                } else if hsb.brightness == 0 {
                    self.turn_off()
                } else if self.address.device_type == DeviceType::Rgbw
                    && settings.rgbw_white_sat_threshold != -1
                    && i32::from(hsb.saturation) <= settings.rgbw_white_sat_threshold
                {
                    self.send(&CommandPayload::command(SET_WHITE))
                } else {
                    let payload = CommandPayload {
                        hue: Some(hsb.hue),
                        saturation: Some(hsb.saturation),
                        ..CommandPayload::on_at(hsb.brightness)
                    };
                    self.send(&payload)?;
                    self.saved_level = hsb.brightness;
                    Ok(())
                }
            }
            GlobeCommand::Percent(level) => self.dim_to(level),
            other => self.ignore(ChannelKind::Colour, other),
        }
    }

    /// Level change shared by the level and colour channels.
    fn dim_to(&mut self, level: u8) -> Result<(), QueueError> {
        let context = self.context.clone();
        let settings = context.globe_settings();
        if level == 1 && settings.one_triggers_night_mode {
            return self.send(&CommandPayload::command(NIGHT_MODE));
        }

        self.send(&CommandPayload::on_at(level))?;
        if self.address.device_type.has_tunable_white()
            && settings.auto_ctemp_max_dimmed != 0
            && self.bulb_mode.as_deref() == Some("white")
        {
            let color_temp = self.auto_colour_temp(level);
            self.send(&CommandPayload::white_at(color_temp))?;
        }
        self.saved_level = level;
        Ok(())
    }

    fn turn_off(&self) -> Result<(), QueueError> {
        if self.context.globe_settings().power_fails_to_min_dim {
            self.send(&CommandPayload::on_at(0))?;
        }
        self.send(&CommandPayload::off())
    }

    fn send_bulb_command(&self, text: &str) -> Result<(), QueueError> {
        if text == FAVOURITE_WHITE {
            let favourite = self.context.globe_settings().favourite_white;
            self.send(&CommandPayload::white_at(favourite))
        } else {
            self.send(&CommandPayload::command(text))
        }
    }

    fn send(&self, payload: &CommandPayload<'_>) -> Result<(), QueueError> {
        if !self.context.is_online() {
            debug!(
                "Holding command for {} until the bridge is back online ({:?})",
                self.address,
                self.context.status()
            );
        }
        self.context.outbound().enqueue(&self.topic, &payload.to_json())
    }

    fn ignore(&self, channel: ChannelKind, command: GlobeCommand) -> Result<(), QueueError> {
        warn!(
            "Ignoring unsupported command {:?} on {} for {}",
            command, channel, self.address
        );
        Ok(())
    }
}

/// Hub colour temperature for a 0..=100 percent (100 is coolest).
pub fn percent_to_colour_temp(percent: u8) -> u16 {
    (370.0 - 2.17 * f64::from(percent)).round() as u16
}
