use serde::Deserialize;

/// Top-level configuration settings for the bridge.
///
/// Includes the broker connection, queue pacing, decoding/encoding policy
/// for the globes and the bridge identity.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub mqtt: MqttSettings,
    pub pacing: PacingSettings,
    pub globe: GlobeSettings,
    pub bridge: BridgeSettings,
}

/// Configuration settings for the MQTT broker connection.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id_prefix: String,
    pub keep_alive_secs: u64,
    pub max_inflight: u16,
    pub clean_session: bool,
    pub state_filter: String,
}

/// Timer intervals of the three periodic lanes.
///
/// `normal_delay_ms` and `same_globe_delay_ms` drive the outbound ticker
/// depending on the current pacing mode.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PacingSettings {
    pub normal_delay_ms: u64,
    pub same_globe_delay_ms: u64,
    pub inbound_drain_ms: u64,
    pub connection_poll_secs: u64,
}

/// Per-bridge policy consumed when decoding states and encoding commands.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GlobeSettings {
    pub trigger_white_hue: u16,
    pub trigger_white_sat: u16,
    pub favourite_white: u16,
    /// `0` disables automatic colour temperature while dimming.
    pub auto_ctemp_max_dimmed: u16,
    /// `-1` disables the RGBW white threshold.
    pub rgbw_white_sat_threshold: i32,
    pub one_triggers_night_mode: bool,
    pub power_fails_to_min_dim: bool,
    pub level_follows_colour: bool,
    pub default_command: String,
}

/// Identity of this bridge instance.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BridgeSettings {
    pub id: String,
    pub log_level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values are filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub mqtt: Option<PartialMqttSettings>,
    pub pacing: Option<PartialPacingSettings>,
    pub globe: Option<PartialGlobeSettings>,
    pub bridge: Option<PartialBridgeSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialMqttSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id_prefix: Option<String>,
    pub keep_alive_secs: Option<u64>,
    pub max_inflight: Option<u16>,
    pub clean_session: Option<bool>,
    pub state_filter: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialPacingSettings {
    pub normal_delay_ms: Option<u64>,
    pub same_globe_delay_ms: Option<u64>,
    pub inbound_drain_ms: Option<u64>,
    pub connection_poll_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialGlobeSettings {
    pub trigger_white_hue: Option<u16>,
    pub trigger_white_sat: Option<u16>,
    pub favourite_white: Option<u16>,
    pub auto_ctemp_max_dimmed: Option<u16>,
    pub rgbw_white_sat_threshold: Option<i32>,
    pub one_triggers_night_mode: Option<bool>,
    pub power_fails_to_min_dim: Option<bool>,
    pub level_follows_colour: Option<bool>,
    pub default_command: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBridgeSettings {
    pub id: Option<String>,
    pub log_level: Option<String>,
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            mqtt: MqttSettings {
                host: "127.0.0.1".to_string(),
                port: 1883,
                username: None,
                password: None,
                client_id_prefix: "milight-bridge".to_string(),
                keep_alive_secs: 15,
                max_inflight: 30,
                clean_session: false,
                state_filter: "milight/states/#".to_string(),
            },
            pacing: PacingSettings {
                normal_delay_ms: 50,
                same_globe_delay_ms: 65,
                inbound_drain_ms: 10,
                connection_poll_secs: 10,
            },
            globe: GlobeSettings {
                trigger_white_hue: 36,
                trigger_white_sat: 32,
                favourite_white: 200,
                auto_ctemp_max_dimmed: 0,
                rgbw_white_sat_threshold: 12,
                one_triggers_night_mode: true,
                power_fails_to_min_dim: true,
                level_follows_colour: false,
                default_command: "next_mode".to_string(),
            },
            bridge: BridgeSettings {
                id: "hub".to_string(),
                log_level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Fills every value missing from `self` with the matching field of `default`.
    pub fn merge_onto(self, default: Settings) -> Settings {
        let mqtt = self.mqtt.unwrap_or_default();
        let pacing = self.pacing.unwrap_or_default();
        let globe = self.globe.unwrap_or_default();
        let bridge = self.bridge.unwrap_or_default();

        Settings {
            mqtt: MqttSettings {
                host: mqtt.host.unwrap_or(default.mqtt.host),
                port: mqtt.port.unwrap_or(default.mqtt.port),
                username: mqtt.username.or(default.mqtt.username),
                password: mqtt.password.or(default.mqtt.password),
                client_id_prefix: mqtt
                    .client_id_prefix
                    .unwrap_or(default.mqtt.client_id_prefix),
                keep_alive_secs: mqtt.keep_alive_secs.unwrap_or(default.mqtt.keep_alive_secs),
                max_inflight: mqtt.max_inflight.unwrap_or(default.mqtt.max_inflight),
                clean_session: mqtt.clean_session.unwrap_or(default.mqtt.clean_session),
                state_filter: mqtt.state_filter.unwrap_or(default.mqtt.state_filter),
            },
            pacing: PacingSettings {
                normal_delay_ms: pacing
                    .normal_delay_ms
                    .unwrap_or(default.pacing.normal_delay_ms),
                same_globe_delay_ms: pacing
                    .same_globe_delay_ms
                    .unwrap_or(default.pacing.same_globe_delay_ms),
                inbound_drain_ms: pacing
                    .inbound_drain_ms
                    .unwrap_or(default.pacing.inbound_drain_ms),
                connection_poll_secs: pacing
                    .connection_poll_secs
                    .unwrap_or(default.pacing.connection_poll_secs),
            },
            globe: GlobeSettings {
                trigger_white_hue: globe
                    .trigger_white_hue
                    .unwrap_or(default.globe.trigger_white_hue),
                trigger_white_sat: globe
                    .trigger_white_sat
                    .unwrap_or(default.globe.trigger_white_sat),
                favourite_white: globe
                    .favourite_white
                    .unwrap_or(default.globe.favourite_white),
                auto_ctemp_max_dimmed: globe
                    .auto_ctemp_max_dimmed
                    .unwrap_or(default.globe.auto_ctemp_max_dimmed),
                rgbw_white_sat_threshold: globe
                    .rgbw_white_sat_threshold
                    .unwrap_or(default.globe.rgbw_white_sat_threshold),
                one_triggers_night_mode: globe
                    .one_triggers_night_mode
                    .unwrap_or(default.globe.one_triggers_night_mode),
                power_fails_to_min_dim: globe
                    .power_fails_to_min_dim
                    .unwrap_or(default.globe.power_fails_to_min_dim),
                level_follows_colour: globe
                    .level_follows_colour
                    .unwrap_or(default.globe.level_follows_colour),
                default_command: globe
                    .default_command
                    .unwrap_or(default.globe.default_command),
            },
            bridge: BridgeSettings {
                id: bridge.id.unwrap_or(default.bridge.id),
                log_level: bridge.log_level.unwrap_or(default.bridge.log_level),
            },
        }
    }
}
