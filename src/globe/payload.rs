use serde::Serialize;

/// JSON body understood by the hub. Absent fields are left out.
#[derive(Debug, Default, Serialize)]
pub struct CommandPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl<'a> CommandPayload<'a> {
    pub fn on() -> Self {
        Self {
            state: Some("ON"),
            ..Default::default()
        }
    }

    pub fn off() -> Self {
        Self {
            state: Some("OFF"),
            ..Default::default()
        }
    }

    pub fn on_at(level: u8) -> Self {
        Self {
            level: Some(level),
            ..Self::on()
        }
    }

    pub fn white_at(color_temp: u16) -> Self {
        Self {
            color_temp: Some(color_temp),
            ..Self::on()
        }
    }

    pub fn command(command: &'a str) -> Self {
        Self {
            command: Some(command),
            ..Default::default()
        }
    }

    pub fn mode(mode: impl ToString) -> Self {
        Self {
            mode: Some(mode.to_string()),
            ..Default::default()
        }
    }

    /// Serialized form; empty if serialization failed, which the queue rejects.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
