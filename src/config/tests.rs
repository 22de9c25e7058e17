use super::settings::Settings;
use super::load_config_from;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.mqtt.host, "127.0.0.1");
    assert_eq!(settings.mqtt.port, 1883);
    assert_eq!(settings.mqtt.state_filter, "milight/states/#");
    assert_eq!(settings.pacing.normal_delay_ms, 50);
    assert_eq!(settings.pacing.same_globe_delay_ms, 65);
    assert_eq!(settings.globe.rgbw_white_sat_threshold, 12);
    assert!(settings.globe.power_fails_to_min_dim);
    assert!(!settings.globe.level_follows_colour);
    assert_eq!(settings.bridge.id, "hub");
}

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let cfg = temp_env::with_vars_unset(
        ["MILIGHT__PACING__NORMAL_DELAY_MS", "MILIGHT__MQTT__HOST"],
        || load_config_from(tmp.path()),
    )
    .expect("load_config failed");
    assert_eq!(cfg, Settings::default());
}

#[test]
#[serial]
fn test_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let toml = r#"
        [mqtt]
        host = "10.0.0.5"
        username = "lights"

        [pacing]
        normal_delay_ms = 120
        same_globe_delay_ms = 300

        [globe]
        rgbw_white_sat_threshold = -1
        level_follows_colour = true
    "#;
    fs::write(tmp.path().join("default.toml"), toml).expect("write config file");

    let cfg = load_config_from(tmp.path()).expect("load_config failed");
    assert_eq!(cfg.mqtt.host, "10.0.0.5");
    assert_eq!(cfg.mqtt.username.as_deref(), Some("lights"));
    assert_eq!(cfg.mqtt.port, 1883);
    assert_eq!(cfg.pacing.normal_delay_ms, 120);
    assert_eq!(cfg.pacing.same_globe_delay_ms, 300);
    assert_eq!(cfg.pacing.inbound_drain_ms, 10);
    assert_eq!(cfg.globe.rgbw_white_sat_threshold, -1);
    assert!(cfg.globe.level_follows_colour);
    assert_eq!(cfg.globe.favourite_white, 200);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    fs::write(
        tmp.path().join("default.toml"),
        "[pacing]\nnormal_delay_ms = 120\n",
    )
    .expect("write config file");

    let cfg = temp_env::with_vars(
        [
            ("MILIGHT__PACING__NORMAL_DELAY_MS", Some("75")),
            ("MILIGHT__BRIDGE__ID", Some("garage")),
        ],
        || load_config_from(tmp.path()),
    )
    .expect("load_config failed");

    assert_eq!(cfg.pacing.normal_delay_ms, 75);
    assert_eq!(cfg.bridge.id, "garage");
}
