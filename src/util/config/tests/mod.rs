//! Configuration tests

use crate::bridge::neutral::StringEncoding;
use crate::bridge::value::ObjectId;
use crate::util::config::{
    load_config, load_config_from, parse_config, render_config, save_config, BridgeConfig,
};
use crate::util::logger::LogLevel;

#[test]
fn test_defaults() {
    let config = BridgeConfig::default();
    assert_eq!(config.runtime.string_encoding, StringEncoding::Latin1);
    assert_eq!(config.runtime.invalid_object(), ObjectId::INVALID);
    assert_eq!(config.runtime.default_return_code, 0);
    assert!(config.runtime.save_state_to_stack);
    assert_eq!(config.log.level, LogLevel::Info);
}

#[test]
fn test_partial_file_fills_defaults() {
    let config = parse_config(
        r#"
        [runtime]
        string_encoding = "utf8"
        default_return_code = -1

        [log]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.runtime.string_encoding, StringEncoding::Utf8);
    assert_eq!(config.runtime.default_return_code, -1);
    assert_eq!(config.runtime.max_channel_depth, 4096);
    assert_eq!(config.log.level, LogLevel::Debug);
}

#[test]
fn test_empty_file_is_default() {
    assert_eq!(parse_config("").unwrap(), BridgeConfig::default());
}

#[test]
fn test_bad_value_is_parse_error() {
    let err = parse_config("[runtime]\nstring_encoding = \"ebcdic\"\n").unwrap_err();
    assert!(err.to_string().starts_with("Config parse error"));
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = BridgeConfig::default();
    config.runtime.verbose = true;
    config.runtime.max_neutral_bytes = 64;
    save_config(&config, &path).unwrap();

    assert_eq!(load_config_from(&path).unwrap(), config);
    assert_eq!(load_config(Some(&path)).unwrap(), config);
    assert!(render_config(&config).unwrap().contains("verbose = true"));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(load_config(Some(&path)).is_err());
}
