//! Integration tests for Settings layered loading.
//!
//! These tests only use explicit config files in temp directories; the
//! global config layer is whatever the test machine has, usually nothing.

use std::fs;

use tempfile::TempDir;

use seldrill::config::Settings;
use seldrill::domain::Resolution;
use seldrill::ApplicationError;

#[test]
fn given_explicit_config_with_mode_when_load_then_mode_applied() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seldrill.toml");
    fs::write(&path, "default_mode = \"expanded\"\n").unwrap();

    // Act
    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    // Assert
    assert_eq!(settings.default_mode, Resolution::Expander);
}

#[test]
fn given_explicit_config_with_show_tree_only_when_load_then_flag_set() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seldrill.toml");
    fs::write(&path, "show_tree = true\n").unwrap();

    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    assert!(settings.show_tree);
}

#[test]
fn given_invalid_toml_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seldrill.toml");
    fs::write(&path, "default_mode = [unclosed\n").unwrap();

    let result = Settings::load(Some(path.as_path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_unknown_mode_in_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seldrill.toml");
    fs::write(&path, "default_mode = \"sideways\"\n").unwrap();

    let result = Settings::load(Some(path.as_path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_missing_explicit_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();

    let result = Settings::load(Some(dir.path().join("absent.toml").as_path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_settings_when_serialized_and_reloaded_then_equal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seldrill.toml");
    let original = Settings {
        default_mode: Resolution::Expander,
        show_tree: true,
    };
    fs::write(&path, original.to_toml().unwrap()).unwrap();

    let reloaded = Settings::load(Some(path.as_path())).expect("load settings");

    assert_eq!(reloaded, original);
}
