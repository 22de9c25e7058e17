mod settings;

use std::path::Path;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{BridgeSettings, GlobeSettings, MqttSettings, PacingSettings, Settings};

/// Loads the configuration from `config/default` and `MILIGHT__*` environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(Path::new("config"))
}

/// Loads `<dir>/default.{toml,yaml,json}` (optional) and the environment,
/// then merges the result onto `Settings::default()`.
pub fn load_config_from(dir: &Path) -> Result<Settings, ConfigError> {
    let file = dir.join("default");
    let builder = Config::builder()
        .add_source(File::with_name(&file.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix("MILIGHT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_onto(Settings::default()))
}

#[cfg(test)]
mod tests;
