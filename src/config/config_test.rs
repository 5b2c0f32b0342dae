use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_confbus_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("CONFBUS__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = AppConfig::default();

    assert_eq!(config.server.listen_address.port(), 8080);
    assert_eq!(config.server.default_key, "custom.config.example");
    assert_eq!(
        config.store.defaults.get("custom.config.example").map(String::as_str),
        Some("default-value")
    );
    assert_eq!(config.store.env_prefix, "APP");
    assert_eq!(config.bus.channel_capacity, 1024);
    assert_eq!(config.refresh.max_retries, 3);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn new_should_keep_static_defaults_without_any_source() {
    cleanup_all_confbus_env_vars();
    let config = AppConfig::new().unwrap();

    assert_eq!(
        config.store.defaults.get("custom.config.example").map(String::as_str),
        Some("default-value")
    );
    assert_eq!(config.refresh.timeout_ms, 500);
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_confbus_env_vars();
    with_vars(
        vec![
            ("CONFBUS__BUS__CHANNEL_CAPACITY", Some("64")),
            ("CONFBUS__REFRESH__MAX_RETRIES", Some("5")),
        ],
        || {
            let config = AppConfig::new().unwrap();

            assert_eq!(config.bus.channel_capacity, 64);
            assert_eq!(config.refresh.max_retries, 5);
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_confbus_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("override.toml");

    std::fs::write(
        &config_path,
        r#"
        [server]
        listen_address = "127.0.0.1:9191"
        default_key = "feature.flag"

        [store.defaults]
        "feature.flag" = "off"

        [refresh]
        timeout_ms = 250
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base_config = AppConfig::new().expect("success");
        let config = base_config
            .with_override_config(config_path.to_str().unwrap())
            .unwrap();

        assert_eq!(config.server.listen_address.port(), 9191);
        assert_eq!(config.server.default_key, "feature.flag");
        assert_eq!(config.store.defaults.get("feature.flag").map(String::as_str), Some("off"));
        assert_eq!(config.refresh.timeout_ms, 250);
        // Untouched sections keep their defaults
        assert_eq!(config.refresh.max_retries, 3);
    });
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_confbus_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("confbus.toml");
    std::fs::write(
        &config_path,
        r#"
        [bus]
        channel_capacity = 10
        dedup_window = 8
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("CONFBUS__BUS__CHANNEL_CAPACITY", Some("20")),
        ],
        || {
            let config = AppConfig::new().unwrap();

            assert_eq!(config.bus.channel_capacity, 20);
            assert_eq!(config.bus.dedup_window, 8);
        },
    );
}

#[test]
#[serial]
fn missing_config_path_file_should_fail() {
    cleanup_all_confbus_env_vars();
    with_vars(vec![("CONFIG_PATH", Some("/nonexistent/confbus.toml"))], || {
        assert!(AppConfig::new().is_err());
    });
}

#[test]
fn validation_should_reject_zero_port() {
    let mut config = AppConfig::default();
    config.server.listen_address = "127.0.0.1:0".parse().unwrap();

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_empty_default_key() {
    let mut config = AppConfig::default();
    config.server.default_key = "  ".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_zero_channel_capacity() {
    let mut config = AppConfig::default();
    config.bus.channel_capacity = 0;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_inverted_backoff_bounds() {
    let mut config = AppConfig::default();
    config.refresh.base_delay_ms = 5000;
    config.refresh.max_delay_ms = 100;

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("base_delay_ms"));
}

#[test]
fn validation_should_reject_zero_attempts() {
    let mut config = AppConfig::default();
    config.refresh.max_retries = 0;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_empty_default_entry_key() {
    let mut config = AppConfig::default();
    config.store.defaults.insert(String::new(), "x".to_string());

    assert!(config.validate().is_err());
}
